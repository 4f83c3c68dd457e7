use std::path::{Path, PathBuf};

/// Number of pitch classes in a chroma vector
pub const CHROMA_BINS: usize = 12;

/// Raw audio data with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for multi-channel audio)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16, path: &Path) -> Self {
        let frames = samples.len() / channels.max(1) as usize;
        let duration = if sample_rate == 0 {
            0.0
        } else {
            frames as f64 / sample_rate as f64
        };

        Self {
            samples,
            sample_rate,
            channels,
            duration,
            file_path: path.to_path_buf(),
        }
    }

    /// Get mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
            .collect()
    }

    /// Number of sample frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

/// Per-hop spectral features; one entry per output video frame
#[derive(Debug, Clone)]
pub struct SpectralFrames {
    /// Log-spaced band energies, each band normalised to [0, 1] over the song
    pub bands: Vec<Vec<f32>>,

    /// Pitch-class energy, each frame normalised so its loudest class is 1
    pub chroma: Vec<[f32; CHROMA_BINS]>,

    /// RMS level of each analysis window
    pub rms: Vec<f32>,

    /// Hop between frames, in samples
    pub hop_length: usize,

    /// Sample rate the hop is measured in
    pub sample_rate: u32,
}

impl SpectralFrames {
    /// Number of analysis frames
    pub fn len(&self) -> usize {
        self.rms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rms.is_empty()
    }

    /// Number of spectral bands per frame
    pub fn band_count(&self) -> usize {
        self.bands.first().map(Vec::len).unwrap_or(0)
    }

    /// Frames per second implied by the hop length
    pub fn fps(&self) -> f64 {
        self.sample_rate as f64 / self.hop_length as f64
    }
}
