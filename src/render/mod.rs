//! # Render Module
//!
//! The [`FrameGenerator`] trait is the seam where an image model plugs in.
//! [`LatentPreviewGenerator`] is the built-in implementation; [`Renderer`]
//! drives any generator across a whole trajectory.
//!
//! ## Custom Generators
//!
//! ```rust,no_run
//! use noise_visualizer::render::FrameGenerator;
//! use noise_visualizer::{latent::Latent, prompt::Embedding, video::Frame, Result};
//!
//! struct Flat;
//!
//! impl FrameGenerator for Flat {
//!     fn name(&self) -> &str {
//!         "flat"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Solid grey frames"
//!     }
//!
//!     fn generate(&self, latent: &Latent, _embedding: &Embedding, _guidance: f32) -> Result<Frame> {
//!         Ok(Frame::new_filled(latent.width() as u32, latent.height() as u32, [128, 128, 128]))
//!     }
//! }
//! ```

pub mod generator;
pub mod preview;
pub mod renderer;

pub use generator::FrameGenerator;
pub use preview::LatentPreviewGenerator;
pub use renderer::Renderer;
