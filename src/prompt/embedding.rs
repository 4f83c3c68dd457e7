use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PromptError, Result};

/// Above this cosine two vectors are treated as colinear and blended linearly
const SLERP_DOT_THRESHOLD: f32 = 0.9995;

/// How two embeddings are blended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Spherical interpolation; keeps the blend on the arc between the inputs
    #[default]
    Slerp,
    /// Straight linear interpolation
    Lerp,
}

impl FromStr for InterpolationMethod {
    type Err = PromptError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slerp" => Ok(Self::Slerp),
            "lerp" | "linear" => Ok(Self::Lerp),
            other => Err(PromptError::UnknownMethod { method: other.to_string() }),
        }
    }
}

impl InterpolationMethod {
    pub fn apply(&self, a: &[f32], b: &[f32], t: f32) -> Vec<f32> {
        match self {
            Self::Slerp => slerp(a, b, t),
            Self::Lerp => lerp(a, b, t),
        }
    }
}

/// A text-prompt embedding: `tokens` rows of `dim` values
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    tokens: usize,
    dim: usize,
    data: Vec<f32>,
}

impl Embedding {
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let tokens = rows.len();
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != dim) {
            return Err(PromptError::InvalidParameters {
                details: "embedding rows have differing widths".to_string(),
            }
            .into());
        }
        Ok(Self {
            tokens,
            dim,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub(crate) fn from_flat(tokens: usize, dim: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), tokens * dim);
        Self { tokens, dim, data }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.tokens, self.dim)
    }

    pub fn row(&self, token: usize) -> &[f32] {
        &self.data[token * self.dim..(token + 1) * self.dim]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Average over the token rows
    pub fn mean_row(&self) -> Vec<f32> {
        let mut mean = vec![0.0f32; self.dim];
        for t in 0..self.tokens {
            for (m, v) in mean.iter_mut().zip(self.row(t)) {
                *m += v;
            }
        }
        let n = self.tokens.max(1) as f32;
        mean.iter_mut().for_each(|m| *m /= n);
        mean
    }

    /// Blend towards `other` by `t` (0 = self, 1 = other)
    pub fn interpolate(&self, other: &Embedding, t: f32, method: InterpolationMethod) -> Result<Embedding> {
        if self.shape() != other.shape() {
            return Err(PromptError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            }
            .into());
        }
        Ok(Self::from_flat(self.tokens, self.dim, method.apply(&self.data, &other.data, t)))
    }
}

pub fn lerp(a: &[f32], b: &[f32], t: f32) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + t * (y - x)).collect()
}

/// Spherical linear interpolation over the flattened vectors
pub fn slerp(a: &[f32], b: &[f32], t: f32) -> Vec<f32> {
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return lerp(a, b, t);
    }

    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>() / (norm_a * norm_b);
    if dot.abs() > SLERP_DOT_THRESHOLD {
        return lerp(a, b, t);
    }

    let theta_0 = dot.acos();
    let sin_theta_0 = theta_0.sin();
    let theta_t = theta_0 * t;
    let s0 = (theta_0 - theta_t).sin() / sin_theta_0;
    let s1 = theta_t.sin() / sin_theta_0;

    a.iter().zip(b).map(|(x, y)| s0 * x + s1 * y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slerp_endpoints() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let start = slerp(&a, &b, 0.0);
        let end = slerp(&a, &b, 1.0);
        for (x, y) in start.iter().zip(a) {
            assert!((x - y).abs() < 1e-6);
        }
        for (x, y) in end.iter().zip(b) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_slerp_stays_on_unit_circle() {
        let mid = slerp(&[1.0, 0.0], &[0.0, 1.0], 0.5);
        let norm = (mid[0] * mid[0] + mid[1] * mid[1]).sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((mid[0] - mid[1]).abs() < 1e-6);

        // Linear interpolation cuts the corner instead
        let straight = lerp(&[1.0, 0.0], &[0.0, 1.0], 0.5);
        assert!((straight[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_slerp_colinear_falls_back_to_lerp() {
        let out = slerp(&[1.0, 1.0], &[2.0, 2.0], 0.5);
        assert_eq!(out, vec![1.5, 1.5]);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("SLERP".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Slerp);
        assert_eq!("lerp".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Lerp);
        assert!("cubic".parse::<InterpolationMethod>().is_err());
    }

    #[test]
    fn test_interpolate_rejects_shape_mismatch() {
        let a = Embedding::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        let b = Embedding::from_rows(vec![vec![1.0, 0.0, 0.0]]).unwrap();
        assert!(a.interpolate(&b, 0.5, InterpolationMethod::Slerp).is_err());
    }

    #[test]
    fn test_mean_row() {
        let e = Embedding::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(e.mean_row(), vec![2.0, 3.0]);
    }
}
