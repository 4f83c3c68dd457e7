use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rayon::prelude::*;
use tokio::task;
use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::types::{Frame, VideoParams};

/// File name pattern of numbered frames, as both we and FFmpeg see it
const FRAME_PATTERN: &str = "frame_%06d.png";

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: usize,
    pub file_size: u64,
}

/// Writes frames to a scratch directory and muxes them with audio via FFmpeg
pub struct VideoCompositor {
    params: VideoParams,
    frames_dir: Option<PathBuf>,
    owns_dir: bool,
    keep_frames: bool,
    frames_written: usize,
}

impl VideoCompositor {
    pub fn new(params: VideoParams) -> Self {
        Self {
            params,
            frames_dir: None,
            owns_dir: false,
            keep_frames: false,
            frames_written: 0,
        }
    }

    /// Leave the frame directory on disk after the compositor is dropped
    pub fn keep_frames(mut self, keep: bool) -> Self {
        self.keep_frames = keep;
        self
    }

    /// Write frames into `dir` instead of a fresh temp directory.
    /// Cleanup then removes only the frame files, never `dir` itself.
    pub fn with_frames_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.frames_dir = Some(dir.into());
        self.owns_dir = false;
        self
    }

    pub fn params(&self) -> &VideoParams {
        &self.params
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn check_ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Directory holding the numbered frames, created on first use
    pub fn frames_dir(&mut self) -> Result<PathBuf> {
        let dir = match &self.frames_dir {
            Some(dir) => dir.clone(),
            None => {
                let dir = std::env::temp_dir().join(format!("noise_visualizer_{}", std::process::id()));
                self.owns_dir = true;
                self.frames_dir = Some(dir.clone());
                dir
            }
        };
        create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
        dir.join(format!("frame_{:06}.png", index))
    }

    /// Save a batch of frames starting at frame number `start`.
    /// Batches must arrive in order with no gaps.
    pub fn write_frames(&mut self, start: usize, frames: &[Frame]) -> Result<()> {
        if start != self.frames_written {
            return Err(VideoError::InvalidParameters {
                details: format!("expected frame {}, got batch starting at {}", self.frames_written, start),
            }
            .into());
        }

        let dir = self.frames_dir()?;
        frames
            .par_iter()
            .enumerate()
            .try_for_each(|(offset, frame)| {
                let path = Self::frame_path(&dir, start + offset);
                frame.save_png(&path).map_err(|e| VideoError::FrameWriteFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            })?;

        self.frames_written += frames.len();
        debug!("Wrote frames {}..{} to {:?}", start, self.frames_written, dir);
        Ok(())
    }

    /// Encode every written frame and mux the song underneath
    pub async fn compose<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, audio_path: P, output_path: Q) -> Result<EncodedVideo> {
        let output_path = output_path.as_ref().to_path_buf();

        if self.frames_written == 0 {
            return Err(VideoError::InvalidParameters {
                details: "no frames have been written".to_string(),
            }
            .into());
        }
        if !(self.params.fps > 0.0) {
            return Err(VideoError::InvalidParameters {
                details: format!("fps must be positive, got {}", self.params.fps),
            }
            .into());
        }
        if !Self::check_ffmpeg_available() {
            return Err(VideoError::EncodingFailed {
                reason: "FFmpeg not found. Please install FFmpeg.".to_string(),
            }
            .into());
        }

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }

        let dir = self.frames_dir()?;
        info!(
            "Encoding {} frames at {:.3} fps with {} (crf {})",
            self.frames_written,
            self.params.fps,
            self.params.codec,
            self.params.crf()
        );

        let args = self.ffmpeg_args(&dir, audio_path.as_ref(), &output_path);
        debug!("ffmpeg {}", args.join(" "));
        let mut cmd = Command::new("ffmpeg");
        cmd.args(&args);

        let output = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| VideoError::EncodingFailed {
                reason: format!("Failed to spawn FFmpeg process: {}", e),
            })?
            .map_err(|e| VideoError::EncodingFailed {
                reason: format!("FFmpeg execution failed: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", stderr),
            }
            .into());
        }

        let metadata = std::fs::metadata(&output_path)?;
        let encoded = EncodedVideo {
            path: output_path,
            duration: self.frames_written as f64 / self.params.fps,
            frame_count: self.frames_written,
            file_size: metadata.len(),
        };

        info!(
            "Video written: {:.1}s, {} frames, {:.1} MB",
            encoded.duration,
            encoded.frame_count,
            encoded.file_size as f64 / 1024.0 / 1024.0
        );
        Ok(encoded)
    }

    fn ffmpeg_args(&self, frames_dir: &Path, audio_path: &Path, output_path: &Path) -> Vec<String> {
        vec![
            "-framerate".to_string(),
            format!("{:.6}", self.params.fps),
            "-i".to_string(),
            frames_dir.join(FRAME_PATTERN).display().to_string(),
            "-i".to_string(),
            audio_path.display().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            self.params.codec.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-crf".to_string(),
            self.params.crf().to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-shortest".to_string(),
            "-y".to_string(),
            output_path.display().to_string(),
        ]
    }

    pub fn cleanup(&mut self) -> Result<()> {
        if self.keep_frames {
            if let Some(dir) = &self.frames_dir {
                info!("Keeping rendered frames in {:?}", dir);
            }
            return Ok(());
        }

        let Some(dir) = self.frames_dir.take() else {
            return Ok(());
        };

        if self.owns_dir {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("Failed to remove frame directory {:?}: {}", dir, e);
            }
        } else {
            for index in 0..self.frames_written {
                let path = Self::frame_path(&dir, index);
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("Failed to remove frame {:?}: {}", path, e);
                }
            }
        }
        self.frames_written = 0;
        Ok(())
    }
}

impl Drop for VideoCompositor {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params() -> VideoParams {
        VideoParams {
            fps: 22050.0 / 377.0,
            codec: "libx264".to_string(),
            quality: 85,
        }
    }

    #[test]
    fn test_write_frames_in_order() {
        let dir = tempdir().unwrap();
        let frames_dir = dir.path().join("frames");
        let mut compositor = VideoCompositor::new(params())
            .with_frames_dir(&frames_dir)
            .keep_frames(true);

        let batch = vec![Frame::new_filled(8, 8, [0, 0, 0]); 3];
        compositor.write_frames(0, &batch).unwrap();
        compositor.write_frames(3, &batch[..1]).unwrap();

        assert_eq!(compositor.frames_written(), 4);
        assert!(VideoCompositor::frame_path(&frames_dir, 3).exists());
        assert!(!VideoCompositor::frame_path(&frames_dir, 4).exists());
    }

    #[test]
    fn test_out_of_order_batch_is_rejected() {
        let dir = tempdir().unwrap();
        let mut compositor = VideoCompositor::new(params()).with_frames_dir(dir.path().join("f"));
        let batch = vec![Frame::new_filled(2, 2, [0, 0, 0])];
        assert!(compositor.write_frames(1, &batch).is_err());
    }

    #[test]
    fn test_cleanup_removes_frames_unless_kept() {
        let dir = tempdir().unwrap();
        let frames_dir = dir.path().join("frames");
        {
            let mut compositor = VideoCompositor::new(params()).with_frames_dir(&frames_dir);
            compositor.write_frames(0, &[Frame::new_filled(2, 2, [1, 1, 1])]).unwrap();
        }
        assert!(!VideoCompositor::frame_path(&frames_dir, 0).exists());

        {
            let mut compositor = VideoCompositor::new(params())
                .with_frames_dir(&frames_dir)
                .keep_frames(true);
            compositor.write_frames(0, &[Frame::new_filled(2, 2, [1, 1, 1])]).unwrap();
        }
        assert!(VideoCompositor::frame_path(&frames_dir, 0).exists());
    }

    #[test]
    fn test_cleanup_leaves_caller_files_alone() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"keep me").unwrap();
        {
            let mut compositor = VideoCompositor::new(params()).with_frames_dir(dir.path());
            compositor.write_frames(0, &vec![Frame::new_filled(2, 2, [1, 1, 1]); 2]).unwrap();
        }
        assert!(notes.exists());
        assert!(dir.path().exists());
        assert!(!VideoCompositor::frame_path(dir.path(), 0).exists());
        assert!(!VideoCompositor::frame_path(dir.path(), 1).exists());
    }

    #[test]
    fn test_owned_temp_dir_is_removed() {
        let mut compositor = VideoCompositor::new(params());
        let frames_dir = compositor.frames_dir().unwrap();
        compositor.write_frames(0, &[Frame::new_filled(2, 2, [1, 1, 1])]).unwrap();
        assert!(frames_dir.exists());
        drop(compositor);
        assert!(!frames_dir.exists());
    }

    #[test]
    fn test_ffmpeg_args_use_fractional_rate() {
        let compositor = VideoCompositor::new(params());
        let args = compositor.ffmpeg_args(Path::new("/tmp/f"), Path::new("song.mp3"), Path::new("out.mp4"));
        assert_eq!(args[1], "58.488064");
        assert!(args.iter().any(|a| a.ends_with("frame_%06d.png")));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[tokio::test]
    async fn test_compose_without_frames_fails() {
        let mut compositor = VideoCompositor::new(params());
        let result = compositor.compose("song.wav", "out.mp4").await;
        assert!(result.is_err());
    }
}
