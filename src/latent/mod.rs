//! # Latent Module
//!
//! Seeded noise tensors and the spectrum-paced walk through them that gives
//! each video frame its starting latent.

pub mod tensor;
pub mod trajectory;

pub use tensor::{standard_normal, Latent, LatentShape};
pub use trajectory::LatentTrajectory;
