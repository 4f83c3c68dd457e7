use image::{imageops::FilterType, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// A single rendered video frame
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Frame filled with a single colour
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Rgb(color)),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Resize with a Lanczos3 filter
    pub fn upscaled(&self, width: u32, height: u32) -> Frame {
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        Frame::new(image::imageops::resize(&self.buffer, width, height, FilterType::Lanczos3))
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save_with_format(path, image::ImageFormat::Png)
    }
}

/// Output encoding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoParams {
    /// Output frame rate
    pub fps: f64,

    /// FFmpeg video codec
    pub codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl VideoParams {
    /// FFmpeg constant rate factor for the quality setting
    pub fn crf(&self) -> u8 {
        (51 - ((self.quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_filled_frame() {
        let frame = Frame::new_filled(4, 3, [10, 20, 30]);
        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(frame.get_pixel(3, 2), [10, 20, 30]);
        assert_eq!(frame.get_pixel(0, 0), [10, 20, 30]);
    }

    #[test]
    fn test_upscale_and_save() {
        let frame = Frame::new_filled(2, 2, [200, 100, 50]).upscaled(16, 16);
        assert_eq!((frame.width(), frame.height()), (16, 16));
        let px = frame.get_pixel(8, 8);
        for (got, want) in px.iter().zip([200u8, 100, 50]) {
            assert!(got.abs_diff(want) <= 1);
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");
        frame.save_png(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_quality_to_crf() {
        let params = |quality| VideoParams { fps: 30.0, codec: "libx264".into(), quality };
        assert_eq!(params(100).crf(), 0);
        assert_eq!(params(0).crf(), 51);
        assert_eq!(params(85).crf(), 8);
    }
}
