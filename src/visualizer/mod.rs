//! # Visualizer
//!
//! [`NoiseVisualizer`] owns the loaded song and runs the pipeline steps in
//! order: load song, latent walk, frame rate, prompt schedule, rendering and
//! the final mux.

pub mod engine;

pub use engine::{
    NoiseVisualizer, RunParams, DEFAULT_BASE_PROMPT, DEFAULT_DISTANCE, DEFAULT_HOP_LENGTH,
    DEFAULT_SEED, DEFAULT_TARGET_PROMPTS,
};
