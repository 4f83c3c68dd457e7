use std::path::PathBuf;

use clap::Parser;

use crate::prompt::{InterpolationMethod, PromptParams};
use crate::visualizer::{
    RunParams, DEFAULT_BASE_PROMPT, DEFAULT_DISTANCE, DEFAULT_HOP_LENGTH, DEFAULT_SEED,
    DEFAULT_TARGET_PROMPTS,
};

fn default_target_prompts() -> Vec<String> {
    DEFAULT_TARGET_PROMPTS.iter().map(|s| s.to_string()).collect()
}

#[derive(Parser, Debug)]
#[command(
    name = "noise-visualizer",
    version,
    about = "Generate a visualized video based on music and prompts.",
    long_about = "Walks a latent noise space in time with the song's spectrum, blends text prompts by the song's chroma, renders one frame per audio hop and muxes the frames with the song into an MP4."
)]
pub struct Cli {
    /// Path to the song file.
    #[arg(long)]
    pub song: PathBuf,

    /// Path to save the output video.
    #[arg(long)]
    pub output: PathBuf,

    /// Seed for noise generation.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Hop length for audio processing.
    #[arg(long = "hop_length", default_value_t = DEFAULT_HOP_LENGTH)]
    pub hop_length: usize,

    /// Distance for latent space generation.
    #[arg(long, default_value_t = DEFAULT_DISTANCE)]
    pub distance: f32,

    /// Base prompt for image generation.
    #[arg(long = "base_prompt", default_value = DEFAULT_BASE_PROMPT)]
    pub base_prompt: String,

    /// List of target prompts for chroma scaling.
    #[arg(long = "target_prompts", num_args = 1.., default_values_t = default_target_prompts())]
    pub target_prompts: Vec<String>,

    /// Interpolation method for prompt blending (slerp or lerp); overrides the config file.
    #[arg(long)]
    pub method: Option<InterpolationMethod>,

    /// Alpha value for prompt interpolation.
    #[arg(long, default_value_t = 0.8)]
    pub alpha: f32,

    /// Guidance scale for image generation.
    #[arg(long = "guidance_scale", default_value_t = 0.0)]
    pub guidance_scale: f32,

    /// Decay rate of the chroma envelope.
    #[arg(long = "decay_rate", default_value_t = 0.8)]
    pub decay_rate: f32,

    /// Boost applied to strong chroma bins.
    #[arg(long = "boost_factor", default_value_t = 1.75)]
    pub boost_factor: f32,

    /// Envelope level at which the boost kicks in.
    #[arg(long = "boost_threshold", default_value_t = 0.4)]
    pub boost_threshold: f32,

    /// Configuration file (optional)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep the rendered PNG frames after encoding
    #[arg(long)]
    pub keep_frames: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Pipeline parameters; `--method` wins over the config file's method
    pub fn run_params(&self, config_method: InterpolationMethod) -> RunParams {
        let method = self.method.unwrap_or(config_method);
        RunParams {
            song: self.song.clone(),
            output: self.output.clone(),
            hop_length: self.hop_length,
            distance: self.distance,
            base_prompt: self.base_prompt.clone(),
            target_prompts: self.target_prompts.clone(),
            guidance_scale: self.guidance_scale,
            prompt: PromptParams {
                method,
                alpha: self.alpha,
                decay_rate: self.decay_rate,
                boost_factor: self.boost_factor,
                boost_threshold: self.boost_threshold,
            },
            keep_frames: self.keep_frames,
        }
    }
}
