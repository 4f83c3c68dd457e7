use crate::error::Result;
use crate::latent::Latent;
use crate::prompt::Embedding;
use crate::video::Frame;

/// Core trait for anything that turns a (latent, prompt) pair into an image
pub trait FrameGenerator: Send + Sync {
    /// Returns the unique name of this generator
    fn name(&self) -> &str;

    /// Returns a human-readable description of this generator
    fn description(&self) -> &str;

    /// Render one frame
    ///
    /// # Arguments
    ///
    /// * `latent` - Starting noise for this frame
    /// * `embedding` - Prompt conditioning for this frame
    /// * `guidance_scale` - Strength of prompt guidance; 0 disables classifier-free guidance
    fn generate(&self, latent: &Latent, embedding: &Embedding, guidance_scale: f32) -> Result<Frame>;

    /// Output size for a latent of the given size
    fn output_size(&self, latent_width: usize, latent_height: usize) -> (u32, u32) {
        (latent_width as u32, latent_height as u32)
    }
}
