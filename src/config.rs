use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    prompt::InterpolationMethod,
};

/// Main configuration for the noise visualizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spectral analysis settings
    pub audio: AudioConfig,

    /// Latent tensor geometry
    pub latent: LatentConfig,

    /// Prompt embedding settings
    pub prompt: PromptConfig,

    /// Frame rendering settings
    pub render: RenderConfig,

    /// Output encoding settings
    pub video: VideoConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        self.latent.validate()?;
        self.prompt.validate()?;
        self.render.validate()?;
        self.video.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Smallest FFT window that still splits the spectrum into usable bins
pub const MIN_WINDOW_SIZE: usize = 16;

/// Spectral analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// FFT window size in samples, a power of two of at least [`MIN_WINDOW_SIZE`]
    pub window_size: usize,

    /// Number of log-spaced spectral bands driving the latent walk
    pub bands: usize,

    /// Lowest frequency (Hz) that contributes to chroma
    pub min_frequency: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            bands: 8,
            min_frequency: 32.7, // C1
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        if self.window_size < MIN_WINDOW_SIZE || !self.window_size.is_power_of_two() {
            return Err(invalid("audio.window_size", self.window_size).into());
        }

        if self.bands == 0 {
            return Err(invalid("audio.bands", self.bands).into());
        }

        if !(self.min_frequency > 0.0) {
            return Err(invalid("audio.min_frequency", self.min_frequency).into());
        }

        Ok(())
    }
}

/// Latent tensor geometry (per frame)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentConfig {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl Default for LatentConfig {
    fn default() -> Self {
        Self {
            channels: 4,
            height: 64,
            width: 64,
        }
    }
}

impl LatentConfig {
    fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(invalid("latent.channels", self.channels).into());
        }
        if self.height == 0 || self.width == 0 {
            return Err(invalid("latent.size", format!("{}x{}", self.width, self.height)).into());
        }
        Ok(())
    }
}

/// Prompt embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Token rows per embedding
    pub tokens: usize,

    /// Width of each token row
    pub dim: usize,

    /// How base and target embeddings are blended
    pub method: InterpolationMethod,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            tokens: 77,
            dim: 768,
            method: InterpolationMethod::Slerp,
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<()> {
        if self.tokens == 0 {
            return Err(invalid("prompt.tokens", self.tokens).into());
        }
        if self.dim == 0 {
            return Err(invalid("prompt.dim", self.dim).into());
        }
        Ok(())
    }
}

/// Frame rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Upsampling factor from latent pixels to output pixels
    pub scale: u32,

    /// Frames rendered in parallel before being flushed to disk
    pub batch_size: usize,

    /// Number of rendering threads
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 8,
            batch_size: 32,
            threads: num_cpus::get(),
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(invalid("render.scale", self.scale).into());
        }
        if self.batch_size == 0 {
            return Err(invalid("render.batch_size", self.batch_size).into());
        }
        if self.threads == 0 {
            return Err(invalid("render.threads", self.threads).into());
        }
        Ok(())
    }
}

/// Output encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// FFmpeg video codec
    pub codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            quality: 85,
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.codec.trim().is_empty() {
            return Err(invalid("video.codec", &self.codec).into());
        }
        if self.quality > 100 {
            return Err(invalid("video.quality", self.quality).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.prompt.method = InterpolationMethod::Lerp;
        original_config.render.batch_size = 7;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.prompt.method, InterpolationMethod::Lerp);
        assert_eq!(loaded_config.render.batch_size, 7);
        assert_eq!(loaded_config.audio.window_size, original_config.audio.window_size);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[latent]\nheight = 32\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.latent.height, 32);
        assert_eq!(config.latent.width, 64);
        assert_eq!(config.video.codec, "libx264");
    }

    #[test]
    fn test_invalid_window_size() {
        let mut config = Config::default();
        config.audio.window_size = 1000;
        assert!(config.validate().is_err());

        // Powers of two too small to hold a spectrum
        for size in [1, 2, 8] {
            config.audio.window_size = size;
            assert!(config.validate().is_err(), "window_size {} accepted", size);
        }
        config.audio.window_size = MIN_WINDOW_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_quality() {
        let mut config = Config::default();
        config.video.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::error::VisualizerError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
