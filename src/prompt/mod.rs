//! # Prompt Module
//!
//! Text prompts become embeddings through a [`PromptEncoder`], and a
//! [`PromptSchedule`] blends the base prompt towards the target prompts frame
//! by frame, steered by the song's chroma.

pub mod embedding;
pub mod encoder;
pub mod schedule;

pub use embedding::{lerp, slerp, Embedding, InterpolationMethod};
pub use encoder::{HashingEncoder, PromptEncoder};
pub use schedule::{PromptParams, PromptSchedule};
