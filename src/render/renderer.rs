use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{RenderError, Result};
use crate::latent::LatentTrajectory;
use crate::prompt::PromptSchedule;
use crate::render::generator::FrameGenerator;
use crate::video::Frame;

/// Renders every frame of a trajectory in fixed-size parallel batches
pub struct Renderer<'a> {
    generator: &'a dyn FrameGenerator,
    batch_size: usize,
    pool: rayon::ThreadPool,
}

impl<'a> Renderer<'a> {
    pub fn new(generator: &'a dyn FrameGenerator, batch_size: usize, threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("render-{}", i))
            .build()
            .map_err(|e| RenderError::ThreadPool { reason: e.to_string() })?;

        Ok(Self {
            generator,
            batch_size: batch_size.max(1),
            pool,
        })
    }

    /// Render all frames, handing each finished batch to `sink` in order.
    ///
    /// `sink` receives the index of the batch's first frame. Only one batch is
    /// held in memory at a time. Returns the number of frames rendered.
    pub fn render<F>(
        &self,
        latents: &LatentTrajectory,
        prompts: &PromptSchedule,
        guidance_scale: f32,
        mut sink: F,
    ) -> Result<usize>
    where
        F: FnMut(usize, Vec<Frame>) -> Result<()>,
    {
        if latents.len() != prompts.len() {
            return Err(RenderError::LengthMismatch {
                latents: latents.len(),
                embeddings: prompts.len(),
            }
            .into());
        }

        let total = latents.len();
        let started = Instant::now();
        info!(
            "Rendering {} frames with {} in batches of {} on {} threads",
            total,
            self.generator.name(),
            self.batch_size,
            self.pool.current_num_threads()
        );

        for start in (0..total).step_by(self.batch_size) {
            let end = (start + self.batch_size).min(total);
            let frames = self.pool.install(|| {
                (start..end)
                    .into_par_iter()
                    .map(|i| self.render_frame(latents, prompts, guidance_scale, i))
                    .collect::<Result<Vec<Frame>>>()
            })?;

            sink(start, frames)?;

            let elapsed = started.elapsed().as_secs_f64();
            debug!(
                "Rendered {}/{} frames ({:.1} frames/s)",
                end,
                total,
                end as f64 / elapsed.max(1e-9)
            );
        }

        info!("Rendered {} frames in {:.1}s", total, started.elapsed().as_secs_f64());
        Ok(total)
    }

    fn render_frame(
        &self,
        latents: &LatentTrajectory,
        prompts: &PromptSchedule,
        guidance_scale: f32,
        index: usize,
    ) -> Result<Frame> {
        let latent = latents.latent_at(index)?;
        let embedding = prompts.embedding_at(index)?;
        self.generator
            .generate(&latent, &embedding, guidance_scale)
            .map_err(|e| {
                RenderError::GenerationFailed {
                    index,
                    reason: e.to_string(),
                }
                .into()
            })
    }
}
