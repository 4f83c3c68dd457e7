use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// Audio file loader supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file into interleaved f32 samples
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref().to_path_buf();
        let extension = Self::detect_format(&path).unwrap_or_default();

        if !Self::is_format_supported(&extension) {
            return Err(AudioError::UnsupportedFormat { format: extension }.into());
        }

        // Decoding is CPU bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || match extension.as_str() {
            "wav" => Self::load_wav(&path),
            _ => Self::load_with_symphonia(&path),
        })
        .await
        .map_err(|e| AudioError::AnalysisFailed {
            reason: format!("decoder task panicked: {}", e),
        })?
    }

    /// WAV goes through hound, which handles every PCM layout we care about
    fn load_wav(path: &Path) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed {
            path: path.display().to_string(),
        };

        let reader = hound::WavReader::open(path).map_err(|_| load_failed())?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| load_failed())?,
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| Self::int_to_float(v, bits)))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| load_failed())?
            }
        };

        debug!(
            "Decoded WAV: {} samples, {} Hz, {} channel(s), {} bit",
            samples.len(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample
        );

        Ok(AudioData::new(samples, spec.sample_rate, spec.channels, path))
    }

    /// Compressed formats go through symphonia's probe and default codecs
    fn load_with_symphonia(path: &Path) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed {
            path: path.display().to_string(),
        };

        let file = File::open(path).map_err(|_| load_failed())?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| load_failed())?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(load_failed)?;
        let track_id = track.id;

        let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
            AudioError::InvalidParameters {
                details: "No sample rate found".to_string(),
            }
        })?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream surfaces as an IO error
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    channels = spec.channels.count() as u16;

                    let needed = decoded.capacity() * spec.channels.count();
                    if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
                        sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(_) => break,
            }
        }

        if channels == 0 {
            return Err(AudioError::InvalidParameters {
                details: "No channel information found".to_string(),
            }
            .into());
        }

        debug!(
            "Decoded {:?}: {} samples, {} Hz, {} channel(s)",
            path.file_name(),
            samples.len(),
            sample_rate,
            channels
        );

        Ok(AudioData::new(samples, sample_rate, channels, path))
    }

    /// Convert integer sample to float (-1.0 to 1.0)
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => sample as f32 / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0,
        }
    }

    /// Lowercase file extension, if any
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        SUPPORTED_EXTENSIONS.contains(&extension.to_lowercase().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_sine(path: &Path, freq: f32, sample_rate: u32, seconds: f32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let n = (sample_rate as f32 * seconds) as usize;
        for i in 0..n {
            let t = i as f32 / sample_rate as f32;
            let v = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5;
            for _ in 0..channels {
                writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioLoader::detect_format("test.wav"), Some("wav".to_string()));
        assert_eq!(AudioLoader::detect_format("test.MP3"), Some("mp3".to_string()));
        assert_eq!(AudioLoader::detect_format("test"), None);
    }

    #[test]
    fn test_format_support() {
        assert!(AudioLoader::is_format_supported("wav"));
        assert!(AudioLoader::is_format_supported("FLAC"));
        assert!(!AudioLoader::is_format_supported("xyz"));
        assert!(!AudioLoader::is_format_supported(""));
    }

    #[test]
    fn test_int_to_float_conversion() {
        assert_eq!(AudioLoader::int_to_float(0, 16), 0.0);
        assert_eq!(AudioLoader::int_to_float(-32768, 16), -1.0);
        assert_eq!(AudioLoader::int_to_float(-8388608, 24), -1.0);
    }

    #[tokio::test]
    async fn test_load_stereo_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine(&path, 440.0, 22050, 0.5, 2);

        let audio = AudioLoader::load(&path).await.unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.samples.len(), 11025 * 2);
        assert!((audio.duration - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.xyz");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"dummy content").unwrap();

        let result = AudioLoader::load(&file_path).await;
        match result {
            Err(crate::error::VisualizerError::Audio(AudioError::UnsupportedFormat { format })) => {
                assert_eq!(format, "xyz");
            }
            other => panic!("Expected UnsupportedFormat error, got {:?}", other.map(|a| a.duration)),
        }
    }

    #[tokio::test]
    async fn test_missing_wav_fails_to_load() {
        let result = AudioLoader::load("/nope/missing.wav").await;
        assert!(matches!(
            result,
            Err(crate::error::VisualizerError::Audio(AudioError::LoadFailed { .. }))
        ));
    }
}
