use std::sync::Arc;

use rayon::prelude::*;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use tracing::{debug, info};

use crate::audio::types::{AudioData, SpectralFrames, CHROMA_BINS};
use crate::config::{AudioConfig, MIN_WINDOW_SIZE};
use crate::error::{AudioError, Result};

/// Short-time spectral analysis producing one feature frame per hop
pub struct SpectralAnalyzer {
    config: AudioConfig,
}

/// Raw per-window output before song-level normalisation
struct WindowFeatures {
    bands: Vec<f32>,
    chroma: [f32; CHROMA_BINS],
    rms: f32,
}

impl SpectralAnalyzer {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Analyse a song with one frame every `hop_length` samples.
    ///
    /// Windows are centred on their hop position (zero padded at the edges),
    /// so a song of `n` samples yields `1 + n / hop_length` frames.
    pub fn analyze(&self, audio: &AudioData, hop_length: usize) -> Result<SpectralFrames> {
        if hop_length == 0 {
            return Err(AudioError::InvalidParameters {
                details: "hop_length must be greater than zero".to_string(),
            }
            .into());
        }
        if self.config.window_size < MIN_WINDOW_SIZE {
            return Err(AudioError::InvalidParameters {
                details: format!(
                    "window_size must be at least {}, got {}",
                    MIN_WINDOW_SIZE, self.config.window_size
                ),
            }
            .into());
        }
        if audio.sample_rate == 0 {
            return Err(AudioError::InvalidParameters {
                details: "sample rate is zero".to_string(),
            }
            .into());
        }

        let mono = audio.mono_samples();
        if mono.is_empty() {
            return Err(AudioError::AnalysisFailed {
                reason: format!("{} contains no samples", audio.file_path.display()),
            }
            .into());
        }

        let window_size = self.config.window_size;
        let frame_count = 1 + mono.len() / hop_length;
        info!(
            "Analysing {:.1}s of audio: {} frames, hop {} samples, window {}",
            audio.duration, frame_count, hop_length, window_size
        );

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window_size);
        let window = hann_window(window_size);
        let band_edges = band_edges(
            self.config.bands,
            window_size,
            audio.sample_rate,
            self.config.min_frequency,
        );
        let pitch_classes = pitch_classes(window_size, audio.sample_rate, self.config.min_frequency);

        let features: Vec<WindowFeatures> = (0..frame_count)
            .into_par_iter()
            .map_init(
                || (fft.make_input_vec(), fft.make_output_vec()),
                |(input, spectrum), frame| {
                    self.analyze_window(
                        &mono,
                        frame * hop_length,
                        &window,
                        &fft,
                        input,
                        spectrum,
                        &band_edges,
                        &pitch_classes,
                    )
                },
            )
            .collect::<Result<Vec<_>>>()?;

        let mut bands: Vec<Vec<f32>> = Vec::with_capacity(frame_count);
        let mut chroma = Vec::with_capacity(frame_count);
        let mut rms = Vec::with_capacity(frame_count);
        for f in features {
            bands.push(f.bands);
            chroma.push(f.chroma);
            rms.push(f.rms);
        }

        normalize_bands(&mut bands);

        debug!(
            "Spectral analysis done: {} bands, peak rms {:.3}",
            band_edges.len(),
            rms.iter().copied().fold(0.0f32, f32::max)
        );

        Ok(SpectralFrames {
            bands,
            chroma,
            rms,
            hop_length,
            sample_rate: audio.sample_rate,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn analyze_window(
        &self,
        samples: &[f32],
        center: usize,
        window: &[f32],
        fft: &Arc<dyn RealToComplex<f32>>,
        input: &mut [f32],
        spectrum: &mut [Complex<f32>],
        band_edges: &[(usize, usize)],
        pitch_classes: &[Option<usize>],
    ) -> Result<WindowFeatures> {
        let half = window.len() / 2;
        let mut energy = 0.0f32;

        for (i, slot) in input.iter_mut().enumerate() {
            let sample = (center + i)
                .checked_sub(half)
                .and_then(|idx| samples.get(idx))
                .copied()
                .unwrap_or(0.0);
            energy += sample * sample;
            *slot = sample * window[i];
        }

        fft.process(input, spectrum)
            .map_err(|e| AudioError::AnalysisFailed {
                reason: format!("FFT processing failed: {}", e),
            })?;

        let bands = band_edges
            .iter()
            .map(|&(lo, hi)| {
                let sum: f32 = spectrum[lo..hi].iter().map(|c| c.norm()).sum();
                sum / (hi - lo) as f32
            })
            .collect();

        let mut chroma = [0.0f32; CHROMA_BINS];
        for (bin, class) in pitch_classes.iter().enumerate() {
            if let Some(class) = class {
                chroma[*class] += spectrum[bin].norm_sqr();
            }
        }
        let peak = chroma.iter().copied().fold(0.0f32, f32::max);
        if peak > 0.0 {
            chroma.iter_mut().for_each(|c| *c /= peak);
        }

        Ok(WindowFeatures {
            bands,
            chroma,
            rms: (energy / window.len() as f32).sqrt(),
        })
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    // Periodic Hann, the usual choice for STFT analysis
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Log-spaced `[lo, hi)` bin ranges from `min_frequency` up to Nyquist.
/// Every band gets at least one bin.
fn band_edges(bands: usize, window_size: usize, sample_rate: u32, min_frequency: f32) -> Vec<(usize, usize)> {
    let bins = window_size / 2 + 1;
    let bin_hz = sample_rate as f32 / window_size as f32;
    let nyquist = sample_rate as f32 / 2.0;
    let low = min_frequency.clamp(bin_hz, nyquist);
    let ratio = (nyquist / low).ln();

    let mut edges = Vec::with_capacity(bands);
    let mut start = ((low / bin_hz).floor() as usize).clamp(1, bins - 1);
    for b in 0..bands {
        let upper_hz = low * (ratio * (b + 1) as f32 / bands as f32).exp();
        let mut end = ((upper_hz / bin_hz).ceil() as usize).min(bins);
        if b + 1 == bands {
            end = bins;
        }
        end = end.max(start + 1).min(bins);
        let lo = start.min(end - 1);
        edges.push((lo, end));
        start = end.min(bins - 1);
    }
    edges
}

/// Pitch class (C = 0) for each FFT bin at or above `min_frequency`
fn pitch_classes(window_size: usize, sample_rate: u32, min_frequency: f32) -> Vec<Option<usize>> {
    let bin_hz = sample_rate as f32 / window_size as f32;
    (0..window_size / 2 + 1)
        .map(|bin| {
            let freq = bin as f32 * bin_hz;
            if bin == 0 || freq < min_frequency {
                return None;
            }
            let midi = 12.0 * (freq / 440.0).log2() + 69.0;
            Some((midi.round() as i64).rem_euclid(CHROMA_BINS as i64) as usize)
        })
        .collect()
}

/// Scale every band by its own song-wide maximum
fn normalize_bands(bands: &mut [Vec<f32>]) {
    let Some(width) = bands.first().map(Vec::len) else {
        return;
    };

    for b in 0..width {
        let max = bands.iter().map(|f| f[b]).fold(0.0f32, f32::max);
        if max > 0.0 {
            bands.iter_mut().for_each(|f| f[b] /= max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn tone(freq: f32, sample_rate: u32, seconds: f32) -> AudioData {
        let n = (sample_rate as f32 * seconds) as usize;
        let samples = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();
        AudioData::new(samples, sample_rate, 1, Path::new("tone.wav"))
    }

    #[test]
    fn test_frame_count_follows_hop() {
        let audio = tone(440.0, 22050, 1.0);
        let frames = SpectralAnalyzer::new(AudioConfig::default())
            .analyze(&audio, 377)
            .unwrap();

        assert_eq!(frames.len(), 1 + 22050 / 377);
        assert_eq!(frames.chroma.len(), frames.len());
        assert_eq!(frames.band_count(), AudioConfig::default().bands);
    }

    #[test]
    fn test_chroma_peaks_at_a_for_440hz() {
        let audio = tone(440.0, 22050, 1.0);
        let frames = SpectralAnalyzer::new(AudioConfig::default())
            .analyze(&audio, 512)
            .unwrap();

        let middle = &frames.chroma[frames.len() / 2];
        let (peak_class, _) = middle
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(peak_class, 9); // A
        assert!((middle[9] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bands_are_normalised() {
        let audio = tone(1000.0, 22050, 0.5);
        let frames = SpectralAnalyzer::new(AudioConfig::default())
            .analyze(&audio, 256)
            .unwrap();

        for band in 0..frames.band_count() {
            let max = frames.bands.iter().map(|f| f[band]).fold(0.0f32, f32::max);
            assert!(max <= 1.0 + 1e-6);
        }
        let loudest = frames.bands.iter().flatten().copied().fold(0.0f32, f32::max);
        assert!((loudest - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_hop_is_rejected() {
        let audio = tone(440.0, 22050, 0.1);
        let result = SpectralAnalyzer::new(AudioConfig::default()).analyze(&audio, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_tiny_window_is_rejected() {
        let audio = tone(440.0, 22050, 0.1);
        let config = AudioConfig { window_size: 1, ..AudioConfig::default() };
        let result = SpectralAnalyzer::new(config).analyze(&audio, 377);
        assert!(matches!(
            result,
            Err(crate::error::VisualizerError::Audio(AudioError::InvalidParameters { .. }))
        ));
    }

    #[test]
    fn test_empty_audio_is_rejected() {
        let audio = AudioData::new(vec![], 44100, 1, Path::new("empty.wav"));
        let result = SpectralAnalyzer::new(AudioConfig::default()).analyze(&audio, 512);
        assert!(result.is_err());
    }

    #[test]
    fn test_band_edges_cover_spectrum() {
        let edges = band_edges(8, 2048, 22050, 32.7);
        assert_eq!(edges.len(), 8);
        assert_eq!(edges.last().unwrap().1, 1025);
        assert!(edges.iter().all(|&(lo, hi)| hi > lo));
    }
}
