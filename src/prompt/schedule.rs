use tracing::{debug, info, warn};

use crate::audio::{SpectralFrames, CHROMA_BINS};
use crate::error::{PromptError, Result};
use crate::prompt::embedding::{Embedding, InterpolationMethod};

/// Knobs controlling how chroma steers the prompt blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptParams {
    pub method: InterpolationMethod,
    /// Overall pull towards the target prompts
    pub alpha: f32,
    /// How much of the previous frame's envelope survives (0 = none, 1 = hold forever)
    pub decay_rate: f32,
    /// Multiplier applied to envelope values at or above `boost_threshold`
    pub boost_factor: f32,
    pub boost_threshold: f32,
}

impl Default for PromptParams {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::Slerp,
            alpha: 0.8,
            decay_rate: 0.8,
            boost_factor: 1.75,
            boost_threshold: 0.4,
        }
    }
}

impl PromptParams {
    /// Reject non-finite or negative knobs; pull `decay_rate` into `[0, 1]`
    fn validated(mut self) -> Result<Self> {
        let bad = |details: String| -> Result<Self> {
            Err(PromptError::InvalidParameters { details }.into())
        };

        if !self.decay_rate.is_finite() {
            return bad(format!("decay_rate must be finite, got {}", self.decay_rate));
        }
        if !(0.0..=1.0).contains(&self.decay_rate) {
            let clamped = self.decay_rate.clamp(0.0, 1.0);
            warn!("decay_rate {} is outside [0, 1]; using {}", self.decay_rate, clamped);
            self.decay_rate = clamped;
        }
        if !(self.alpha >= 0.0) {
            return bad(format!("alpha must not be negative, got {}", self.alpha));
        }
        if !(self.boost_factor >= 0.0) {
            return bad(format!("boost_factor must not be negative, got {}", self.boost_factor));
        }
        if !self.boost_threshold.is_finite() {
            return bad(format!("boost_threshold must be finite, got {}", self.boost_threshold));
        }
        Ok(self)
    }
}

/// Per-frame prompt embeddings, materialised on demand.
///
/// Each chroma bin drives one target prompt (bin `k` drives target
/// `k % targets`). A frame's embedding starts at the base prompt and moves
/// towards the chroma-weighted mix of targets by `alpha * strongest weight`.
#[derive(Debug, Clone)]
pub struct PromptSchedule {
    base: Embedding,
    targets: Vec<Embedding>,
    method: InterpolationMethod,
    /// `weights[frame][target]`
    weights: Vec<Vec<f32>>,
    /// How far each frame moves from base towards its target mix
    amounts: Vec<f32>,
}

impl PromptSchedule {
    pub fn build(
        base: Embedding,
        targets: Vec<Embedding>,
        spectral: &SpectralFrames,
        params: PromptParams,
    ) -> Result<Self> {
        let params = params.validated()?;
        if targets.is_empty() {
            return Err(PromptError::NoTargets.into());
        }
        if let Some(bad) = targets.iter().find(|t| t.shape() != base.shape()) {
            return Err(PromptError::ShapeMismatch {
                left: base.shape(),
                right: bad.shape(),
            }
            .into());
        }

        let envelopes = chroma_envelopes(&spectral.chroma, params);
        let mut weights = Vec::with_capacity(envelopes.len());
        let mut amounts = Vec::with_capacity(envelopes.len());

        for env in &envelopes {
            let mut frame_weights = vec![0.0f32; targets.len()];
            for (bin, &value) in env.iter().enumerate() {
                frame_weights[bin % targets.len()] += value;
            }
            let strongest = env.iter().copied().fold(0.0f32, f32::max);
            amounts.push((params.alpha * strongest).clamp(0.0, 1.0));
            weights.push(frame_weights);
        }

        if targets.len() > CHROMA_BINS {
            debug!(
                "{} target prompts but only {} chroma bins; prompts past {} are never reached",
                targets.len(),
                CHROMA_BINS,
                CHROMA_BINS
            );
        }

        let mean_amount = amounts.iter().sum::<f32>() / amounts.len().max(1) as f32;
        info!(
            "Prompt schedule: {} frames, {} targets, {:?}, mean pull {:.2}",
            weights.len(),
            targets.len(),
            params.method,
            mean_amount
        );

        Ok(Self {
            base,
            targets,
            method: params.method,
            weights,
            amounts,
        })
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn base(&self) -> &Embedding {
        &self.base
    }

    /// Pull towards the targets at `frame`, in [0, 1]
    pub fn amount_at(&self, frame: usize) -> Option<f32> {
        self.amounts.get(frame).copied()
    }

    /// Target weights at `frame`
    pub fn weights_at(&self, frame: usize) -> Option<&[f32]> {
        self.weights.get(frame).map(Vec::as_slice)
    }

    /// Materialise the embedding for one frame
    pub fn embedding_at(&self, frame: usize) -> Result<Embedding> {
        let out_of_range = || PromptError::FrameOutOfRange {
            index: frame,
            frames: self.len(),
        };
        let amount = self.amount_at(frame).ok_or_else(out_of_range)?;
        let weights = self.weights_at(frame).ok_or_else(out_of_range)?;

        if amount <= 0.0 {
            return Ok(self.base.clone());
        }

        let mix = self.target_mix(weights)?;
        match mix {
            Some(mix) => self.base.interpolate(&mix, amount, self.method),
            None => Ok(self.base.clone()),
        }
    }

    /// Weighted blend of the targets, folded pairwise so each step is a
    /// two-way interpolation: `mix = interp(mix, target, w / (W + w))`.
    fn target_mix(&self, weights: &[f32]) -> Result<Option<Embedding>> {
        let mut mix: Option<Embedding> = None;
        let mut total = 0.0f32;

        for (target, &w) in self.targets.iter().zip(weights) {
            if w <= 0.0 {
                continue;
            }
            mix = Some(match mix {
                None => target.clone(),
                Some(current) => current.interpolate(target, w / (total + w), self.method)?,
            });
            total += w;
        }
        Ok(mix)
    }
}

/// Decaying peak envelope of each chroma bin, with loud bins boosted
fn chroma_envelopes(chroma: &[[f32; CHROMA_BINS]], params: PromptParams) -> Vec<[f32; CHROMA_BINS]> {
    let mut held = [0.0f32; CHROMA_BINS];
    chroma
        .iter()
        .map(|frame| {
            let mut out = [0.0f32; CHROMA_BINS];
            for k in 0..CHROMA_BINS {
                held[k] = frame[k].max(params.decay_rate * held[k]);
                out[k] = if held[k] >= params.boost_threshold {
                    (held[k] * params.boost_factor).min(1.0)
                } else {
                    held[k]
                };
            }
            out
        })
        .collect()
}
