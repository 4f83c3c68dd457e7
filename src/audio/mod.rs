//! # Audio Analysis Module
//!
//! Decodes a song and breaks it into per-frame spectral features. One analysis
//! frame is produced every `hop_length` samples, and each analysis frame later
//! becomes one video frame.
//!
//! ## Features
//!
//! - **Loading**: WAV through hound, compressed formats through symphonia
//! - **Bands**: log-spaced spectral band energies, normalised per band
//! - **Chroma**: 12 pitch-class energies used to steer prompt interpolation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use noise_visualizer::audio::{AudioLoader, SpectralAnalyzer};
//! use noise_visualizer::config::AudioConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let audio = AudioLoader::load("song.wav").await?;
//! let frames = SpectralAnalyzer::new(AudioConfig::default()).analyze(&audio, 377)?;
//!
//! println!("{} frames at {:.2} fps", frames.len(), frames.fps());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod loader;
pub mod types;
pub use analyzer::SpectralAnalyzer;
pub use loader::AudioLoader;
pub use types::{AudioData, SpectralFrames, CHROMA_BINS};
