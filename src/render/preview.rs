use image::{ImageBuffer, Rgb};

use crate::error::{RenderError, Result};
use crate::latent::Latent;
use crate::prompt::Embedding;
use crate::render::generator::FrameGenerator;
use crate::video::Frame;

/// Linear approximation of the SD VAE decoder: one RGB row per latent channel
const LATENT_RGB_FACTORS: [[f32; 3]; 4] = [
    [0.298, 0.207, 0.208],
    [0.187, 0.286, 0.173],
    [-0.158, 0.189, 0.264],
    [-0.184, -0.271, -0.473],
];

/// How strongly the prompt colours the frame
const PROMPT_TINT: f32 = 0.35;

/// Contrast added per unit of guidance scale
const GUIDANCE_CONTRAST: f32 = 0.1;

/// Decodes latents straight to pixels with the latent-preview projection.
///
/// The prompt embedding contributes a colour cast (its mean token row folded
/// into three components), and the guidance scale stretches contrast. Each
/// latent pixel becomes a `scale x scale` block after Lanczos upsampling.
#[derive(Debug, Clone)]
pub struct LatentPreviewGenerator {
    scale: u32,
}

impl LatentPreviewGenerator {
    pub fn new(scale: u32) -> Self {
        Self { scale: scale.max(1) }
    }

    /// Colour cast in [-1, 1] per RGB component
    fn prompt_tint(embedding: &Embedding) -> [f32; 3] {
        let mean = embedding.mean_row();
        let third = (mean.len() / 3).max(1);
        let mut tint = [0.0f32; 3];

        for (k, chunk) in mean.chunks(third).take(3).enumerate() {
            let sum: f32 = chunk.iter().sum();
            let energy = chunk.iter().map(|v| v * v).sum::<f32>().sqrt();
            tint[k] = if energy > 0.0 { (sum / energy).tanh() } else { 0.0 };
        }
        tint
    }
}

impl Default for LatentPreviewGenerator {
    fn default() -> Self {
        Self::new(8)
    }
}

impl FrameGenerator for LatentPreviewGenerator {
    fn name(&self) -> &str {
        "latent-preview"
    }

    fn description(&self) -> &str {
        "Linear latent-to-RGB projection tinted by the prompt embedding"
    }

    fn generate(&self, latent: &Latent, embedding: &Embedding, guidance_scale: f32) -> Result<Frame> {
        if latent.channels() == 0 || latent.width() == 0 || latent.height() == 0 {
            return Err(RenderError::GenerationFailed {
                index: 0,
                reason: "empty latent".to_string(),
            }
            .into());
        }

        let tint = Self::prompt_tint(embedding);
        let contrast = 1.0 + GUIDANCE_CONTRAST * guidance_scale.max(0.0);

        let small = ImageBuffer::from_fn(latent.width() as u32, latent.height() as u32, |x, y| {
            let mut rgb = [0.0f32; 3];
            for c in 0..latent.channels() {
                let v = latent.get(c, y as usize, x as usize);
                let factors = LATENT_RGB_FACTORS[c % LATENT_RGB_FACTORS.len()];
                for (out, f) in rgb.iter_mut().zip(factors) {
                    *out += v * f;
                }
            }

            let mut px = [0u8; 3];
            for k in 0..3 {
                let value = rgb[k] * contrast + PROMPT_TINT * tint[k];
                px[k] = (((value + 1.0) / 2.0).clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            Rgb(px)
        });

        let (width, height) = self.output_size(latent.width(), latent.height());
        Ok(Frame::new(small).upscaled(width, height))
    }

    fn output_size(&self, latent_width: usize, latent_height: usize) -> (u32, u32) {
        (latent_width as u32 * self.scale, latent_height as u32 * self.scale)
    }
}
