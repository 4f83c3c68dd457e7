use rand::Rng;

use crate::error::{LatentError, Result};

/// `count` standard-normal samples via the Box-Muller transform
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<f32> {
    let mut samples = Vec::with_capacity(count);
    while samples.len() < count {
        let u1: f32 = rng.gen_range(1e-10..1.0); // keep ln() finite
        let u2: f32 = rng.gen_range(0.0..1.0);

        let mag = (-2.0 * u1.ln()).sqrt();
        let (sin, cos) = (std::f32::consts::TAU * u2).sin_cos();
        samples.push(mag * cos);
        if samples.len() < count {
            samples.push(mag * sin);
        }
    }
    samples
}

/// Shape of a full latent trajectory, printed as `(frames, channels, height, width)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatentShape {
    pub frames: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl LatentShape {
    /// Elements in a single frame's latent
    pub fn frame_len(&self) -> usize {
        self.channels * self.height * self.width
    }
}

impl std::fmt::Display for LatentShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.frames, self.channels, self.height, self.width)
    }
}

/// One frame's latent, channel-major (`c, y, x`)
#[derive(Debug, Clone, PartialEq)]
pub struct Latent {
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Latent {
    pub fn zeros(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
            data: vec![0.0; channels * height * width],
        }
    }

    /// Standard-normal noise drawn from `rng`
    pub fn gaussian<R: Rng + ?Sized>(channels: usize, height: usize, width: usize, rng: &mut R) -> Self {
        let data = standard_normal(rng, channels * height * width);
        Self {
            channels,
            height,
            width,
            data,
        }
    }

    pub fn from_vec(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != channels * height * width {
            return Err(LatentError::InvalidShape {
                details: format!(
                    "{} values cannot fill {}x{}x{}",
                    data.len(),
                    channels,
                    height,
                    width
                ),
            }
            .into());
        }
        Ok(Self {
            channels,
            height,
            width,
            data,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn get(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, c: usize, y: usize, x: usize, value: f32) {
        self.data[(c * self.height + y) * self.width + x] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn mean(&self) -> f32 {
        self.data.iter().sum::<f32>() / self.data.len().max(1) as f32
    }

    pub fn std(&self) -> f32 {
        let mean = self.mean();
        let var = self.data.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>()
            / self.data.len().max(1) as f32;
        var.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_shape_display() {
        let shape = LatentShape { frames: 10, channels: 4, height: 64, width: 64 };
        assert_eq!(shape.to_string(), "(10, 4, 64, 64)");
        assert_eq!(shape.frame_len(), 4 * 64 * 64);
    }

    #[test]
    fn test_gaussian_statistics() {
        let mut rng = StdRng::seed_from_u64(7);
        let latent = Latent::gaussian(4, 64, 64, &mut rng);
        assert!(latent.mean().abs() < 0.05);
        assert!((latent.std() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_standard_normal_count_is_exact() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(standard_normal(&mut rng, 7).len(), 7);
        assert!(standard_normal(&mut rng, 7).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_indexing_is_channel_major() {
        let mut latent = Latent::zeros(2, 3, 4);
        latent.set(1, 2, 3, 5.0);
        assert_eq!(latent.as_slice()[23], 5.0);
        assert_eq!(latent.get(1, 2, 3), 5.0);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Latent::from_vec(1, 2, 2, vec![0.0; 3]).is_err());
        assert!(Latent::from_vec(1, 2, 2, vec![0.0; 4]).is_ok());
    }
}
