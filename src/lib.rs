//! # Noise Visualizer
//!
//! Turn a song into a music-reactive video.
//!
//! The song is cut into one spectral frame per audio hop. The spectrum paces a
//! walk around a circle in latent noise space, the chroma steers a blend
//! between text-prompt embeddings, a frame generator renders each
//! (latent, prompt) pair, and FFmpeg muxes the frames with the song.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noise_visualizer::{Config, NoiseVisualizer, RunParams};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let mut visualizer = NoiseVisualizer::new(Config::default(), 133780085)?;
//! let video = visualizer.run(&RunParams::new("song.mp3", "output.mp4")).await?;
//!
//! println!("{} frames, {:.1}s", video.frame_count, video.duration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`audio`] - Song loading and spectral analysis
//! - [`latent`] - Seeded noise and the spectrum-paced latent walk
//! - [`prompt`] - Prompt encoding and chroma-driven interpolation
//! - [`render`] - Frame generators and batch rendering
//! - [`video`] - Frames and the FFmpeg compositor
//! - [`visualizer`] - The pipeline itself
//! - [`config`] - Configuration management

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod latent;
pub mod prompt;
pub mod render;
pub mod video;
pub mod visualizer;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, VisualizerError},
    render::FrameGenerator,
    visualizer::{NoiseVisualizer, RunParams},
};
