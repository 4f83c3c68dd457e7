use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::audio::SpectralFrames;
use crate::config::LatentConfig;
use crate::error::{LatentError, Result};
use crate::latent::tensor::{Latent, LatentShape};

/// A walk around a circle in latent noise space, paced by the spectrum.
///
/// Three seeded noise tensors `A`, `B`, `C` define the circle:
///
/// ```text
/// latent[t] = sqrt(1 - d^2) * A + d * (cos(phi) * B + sin(phi) * C)
/// ```
///
/// The latent height is cut into one horizontal strip per spectral band and
/// each strip has its own angle `phi`, which advances in proportion to that
/// band's energy. A strip makes exactly one revolution over the song; silent
/// passages hold still and loud passages move quickly. Because `A`, `B` and
/// `C` are independent standard normals, every latent keeps unit variance.
#[derive(Debug, Clone)]
pub struct LatentTrajectory {
    center: Latent,
    axis_cos: Latent,
    axis_sin: Latent,
    distance: f32,
    /// `angles[t][band]`
    angles: Vec<Vec<f32>>,
    /// Band index of each latent row
    row_band: Vec<usize>,
}

impl LatentTrajectory {
    pub fn new(spectral: &SpectralFrames, config: &LatentConfig, seed: u64, distance: f32) -> Result<Self> {
        if !distance.is_finite() {
            return Err(LatentError::InvalidDistance { distance }.into());
        }
        let distance = if (0.0..=1.0).contains(&distance) {
            distance
        } else {
            let clamped = distance.clamp(0.0, 1.0);
            warn!("distance {} is outside [0, 1]; using {}", distance, clamped);
            clamped
        };
        if spectral.is_empty() {
            return Err(LatentError::InvalidShape {
                details: "no spectral frames to walk over".to_string(),
            }
            .into());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let center = Latent::gaussian(config.channels, config.height, config.width, &mut rng);
        let axis_cos = Latent::gaussian(config.channels, config.height, config.width, &mut rng);
        let axis_sin = Latent::gaussian(config.channels, config.height, config.width, &mut rng);

        let bands = spectral.band_count().max(1);
        let angles = band_angles(&spectral.bands, bands);
        let row_band = (0..config.height).map(|y| y * bands / config.height).collect();

        info!(
            "Latent walk: {} frames, seed {}, distance {:.2}, {} bands",
            angles.len(),
            seed,
            distance,
            bands
        );

        Ok(Self {
            center,
            axis_cos,
            axis_sin,
            distance,
            angles,
            row_band,
        })
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn shape(&self) -> LatentShape {
        LatentShape {
            frames: self.len(),
            channels: self.center.channels(),
            height: self.center.height(),
            width: self.center.width(),
        }
    }

    /// Angle of each band at `frame`
    pub fn angles_at(&self, frame: usize) -> Option<&[f32]> {
        self.angles.get(frame).map(Vec::as_slice)
    }

    /// Materialise the latent for one frame
    pub fn latent_at(&self, frame: usize) -> Result<Latent> {
        let angles = self.angles.get(frame).ok_or(LatentError::FrameOutOfRange {
            index: frame,
            frames: self.len(),
        })?;

        let d = self.distance;
        let radial = (1.0 - d * d).max(0.0).sqrt();
        let (channels, height, width) = (self.center.channels(), self.center.height(), self.center.width());

        let mut latent = Latent::zeros(channels, height, width);
        for y in 0..height {
            let phi = angles[self.row_band[y]];
            let (sin, cos) = phi.sin_cos();
            for c in 0..channels {
                for x in 0..width {
                    let value = radial * self.center.get(c, y, x)
                        + d * (cos * self.axis_cos.get(c, y, x) + sin * self.axis_sin.get(c, y, x));
                    latent.set(c, y, x, value);
                }
            }
        }
        Ok(latent)
    }
}

/// Cumulative band energy mapped onto one full turn per band
fn band_angles(bands: &[Vec<f32>], band_count: usize) -> Vec<Vec<f32>> {
    let totals: Vec<f32> = (0..band_count)
        .map(|b| bands.iter().map(|f| f.get(b).copied().unwrap_or(0.0)).sum())
        .collect();
    debug!("Band energy totals: {:?}", totals);

    let mut running = vec![0.0f32; band_count];
    bands
        .iter()
        .map(|frame| {
            (0..band_count)
                .map(|b| {
                    running[b] += frame.get(b).copied().unwrap_or(0.0);
                    if totals[b] > 0.0 {
                        std::f32::consts::TAU * running[b] / totals[b]
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectral(bands: Vec<Vec<f32>>) -> SpectralFrames {
        let n = bands.len();
        SpectralFrames {
            bands,
            chroma: vec![[0.0; 12]; n],
            rms: vec![0.0; n],
            hop_length: 512,
            sample_rate: 22050,
        }
    }

    fn small_config() -> LatentConfig {
        LatentConfig { channels: 4, height: 16, width: 16 }
    }

    #[test]
    fn test_shape_matches_frames_and_config() {
        let frames = spectral(vec![vec![0.5, 0.2]; 5]);
        let walk = LatentTrajectory::new(&frames, &small_config(), 1, 0.3).unwrap();
        assert_eq!(walk.shape(), LatentShape { frames: 5, channels: 4, height: 16, width: 16 });
        assert_eq!(walk.latent_at(4).unwrap().as_slice().len(), 4 * 16 * 16);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let frames = spectral(vec![vec![1.0, 0.0], vec![0.3, 0.7], vec![0.9, 0.1]]);
        let a = LatentTrajectory::new(&frames, &small_config(), 133780085, 0.3).unwrap();
        let b = LatentTrajectory::new(&frames, &small_config(), 133780085, 0.3).unwrap();
        for t in 0..3 {
            assert_eq!(a.latent_at(t).unwrap(), b.latent_at(t).unwrap());
        }

        let c = LatentTrajectory::new(&frames, &small_config(), 42, 0.3).unwrap();
        assert_ne!(a.latent_at(0).unwrap(), c.latent_at(0).unwrap());
    }

    #[test]
    fn test_zero_distance_is_static() {
        let frames = spectral(vec![vec![1.0], vec![0.2], vec![0.8]]);
        let walk = LatentTrajectory::new(&frames, &small_config(), 5, 0.0).unwrap();
        assert_eq!(walk.latent_at(0).unwrap(), walk.latent_at(2).unwrap());
    }

    #[test]
    fn test_angles_complete_one_turn() {
        let frames = spectral(vec![vec![1.0, 0.0]; 4]);
        let walk = LatentTrajectory::new(&frames, &small_config(), 5, 0.5).unwrap();

        let last = walk.angles_at(3).unwrap();
        assert!((last[0] - std::f32::consts::TAU).abs() < 1e-5);
        // Silent band never moves
        assert_eq!(last[1], 0.0);
        assert!((walk.angles_at(1).unwrap()[0] - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_variance_is_preserved() {
        let frames = spectral(vec![vec![0.4, 0.9]; 8]);
        let config = LatentConfig { channels: 4, height: 64, width: 64 };
        let walk = LatentTrajectory::new(&frames, &config, 11, 0.6).unwrap();
        let latent = walk.latent_at(3).unwrap();
        assert!((latent.std() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_non_finite_distance_is_rejected() {
        let frames = spectral(vec![vec![1.0]]);
        assert!(LatentTrajectory::new(&frames, &small_config(), 0, f32::NAN).is_err());
        assert!(LatentTrajectory::new(&frames, &small_config(), 0, f32::INFINITY).is_err());
    }

    #[test]
    fn test_out_of_range_distance_is_clamped() {
        let frames = spectral(vec![vec![1.0], vec![0.5]]);
        let far = LatentTrajectory::new(&frames, &small_config(), 9, 1.5).unwrap();
        let edge = LatentTrajectory::new(&frames, &small_config(), 9, 1.0).unwrap();
        assert_eq!(far.latent_at(1).unwrap(), edge.latent_at(1).unwrap());
        assert!(far.latent_at(1).unwrap().as_slice().iter().all(|v| v.is_finite()));

        let below = LatentTrajectory::new(&frames, &small_config(), 9, -0.1).unwrap();
        assert_eq!(below.latent_at(0).unwrap(), below.latent_at(1).unwrap());
    }

    #[test]
    fn test_out_of_range_frame() {
        let frames = spectral(vec![vec![1.0]; 2]);
        let walk = LatentTrajectory::new(&frames, &small_config(), 0, 0.3).unwrap();
        assert!(walk.latent_at(2).is_err());
    }
}
