use thiserror::Error;

/// Main error type for the noise visualizer
#[derive(Error, Debug)]
pub enum VisualizerError {
    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Latent generation error: {0}")]
    Latent(#[from] LatentError),

    #[error("Prompt embedding error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline step '{step}' needs {missing} first")]
    NotReady { step: String, missing: String },
}

/// Audio-specific errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Latent trajectory errors
#[derive(Error, Debug)]
pub enum LatentError {
    #[error("Distance must lie within [0, 1], got {distance}")]
    InvalidDistance { distance: f32 },

    #[error("Invalid latent shape: {details}")]
    InvalidShape { details: String },

    #[error("Frame {index} is outside the trajectory ({frames} frames)")]
    FrameOutOfRange { index: usize, frames: usize },
}

/// Prompt encoding and interpolation errors
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("At least one target prompt is required")]
    NoTargets,

    #[error("Embedding shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch { left: (usize, usize), right: (usize, usize) },

    #[error("Invalid prompt parameters: {details}")]
    InvalidParameters { details: String },

    #[error("Unknown interpolation method: {method}")]
    UnknownMethod { method: String },

    #[error("Frame {index} is outside the schedule ({frames} frames)")]
    FrameOutOfRange { index: usize, frames: usize },
}

/// Frame rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Frame generation failed at frame {index}: {reason}")]
    GenerationFailed { index: usize, reason: String },

    #[error("Latent and prompt schedules disagree: {latents} latents vs {embeddings} embeddings")]
    LengthMismatch { latents: usize, embeddings: usize },

    #[error("Failed to build render thread pool: {reason}")]
    ThreadPool { reason: String },
}

/// Video-specific errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Frame write failed: {path}: {reason}")]
    FrameWriteFailed { path: String, reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using VisualizerError
pub type Result<T> = std::result::Result<T, VisualizerError>;

impl VisualizerError {
    pub(crate) fn not_ready(step: &str, missing: &str) -> Self {
        Self::NotReady {
            step: step.to_string(),
            missing: missing.to_string(),
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!("Could not load audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Audio(AudioError::UnsupportedFormat { format }) => {
                format!("Audio format '{}' is not supported. Use wav, mp3, flac, ogg, m4a or aac.", format)
            }
            Self::Video(VideoError::EncodingFailed { reason }) if reason.contains("not found") => {
                "FFmpeg was not found on PATH. Install FFmpeg to write the output video.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
