use rand::{rngs::StdRng, SeedableRng};

use crate::config::PromptConfig;
use crate::error::Result;
use crate::latent::tensor::standard_normal;
use crate::prompt::embedding::Embedding;

const BOS: &str = "<|startoftext|>";
const EOS: &str = "<|endoftext|>";

/// Turns prompt text into an embedding the frame generator understands
pub trait PromptEncoder: Send + Sync {
    fn name(&self) -> &str;

    fn encode(&self, prompt: &str) -> Result<Embedding>;
}

/// Deterministic bag-of-words encoder.
///
/// Every word maps to a fixed random direction (seeded by a stable hash of the
/// word) mixed with a positional direction, so prompts sharing words land
/// near each other and the same prompt always encodes identically. Sequences
/// are framed by start/end markers and padded with the end marker, the layout
/// CLIP-style text encoders use.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    tokens: usize,
    dim: usize,
}

impl HashingEncoder {
    const WORD_WEIGHT: f32 = 0.8;
    const POSITION_WEIGHT: f32 = 0.2;

    pub fn new(config: &PromptConfig) -> Self {
        Self {
            tokens: config.tokens,
            dim: config.dim,
        }
    }

    fn tokenize(prompt: &str) -> Vec<String> {
        prompt
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn direction(&self, key: &str) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(fnv1a(key.as_bytes()));
        standard_normal(&mut rng, self.dim)
    }
}

impl PromptEncoder for HashingEncoder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn encode(&self, prompt: &str) -> Result<Embedding> {
        let words = Self::tokenize(prompt);

        let mut sequence: Vec<&str> = Vec::with_capacity(self.tokens);
        sequence.push(BOS);
        sequence.extend(words.iter().map(String::as_str).take(self.tokens.saturating_sub(2)));
        while sequence.len() < self.tokens {
            sequence.push(EOS);
        }
        sequence.truncate(self.tokens);

        let mut data = Vec::with_capacity(self.tokens * self.dim);
        for (position, token) in sequence.iter().enumerate() {
            let word = self.direction(token);
            let place = self.direction(&format!("<pos:{}>", position));
            let mut row: Vec<f32> = word
                .iter()
                .zip(&place)
                .map(|(w, p)| Self::WORD_WEIGHT * w + Self::POSITION_WEIGHT * p)
                .collect();

            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|v| *v /= norm);
            }
            data.extend(row);
        }

        Ok(Embedding::from_flat(self.tokens, self.dim, data))
    }
}

/// 64-bit FNV-1a; stable across platforms and toolchains
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325u64, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(0x100000001b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> HashingEncoder {
        HashingEncoder::new(&PromptConfig { tokens: 8, dim: 64, ..PromptConfig::default() })
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        let nb = b.iter().map(|v| v * v).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let enc = encoder();
        assert_eq!(enc.encode("horse").unwrap(), enc.encode("horse").unwrap());
        assert_eq!(enc.encode("Horse!").unwrap(), enc.encode("horse").unwrap());
    }

    #[test]
    fn test_shape_and_unit_rows() {
        let emb = encoder().encode("turkish rug in a room").unwrap();
        assert_eq!(emb.shape(), (8, 64));
        for t in 0..8 {
            let norm = emb.row(t).iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_shared_words_are_closer() {
        let enc = encoder();
        let a = enc.encode("massive hamburger").unwrap();
        let b = enc.encode("massive hamburger yummmm").unwrap();
        let c = enc.encode("giant centipede").unwrap();
        assert!(cosine(a.as_slice(), b.as_slice()) > cosine(a.as_slice(), c.as_slice()));
    }

    #[test]
    fn test_word_rows_shift_with_position() {
        let enc = encoder();
        let a = enc.encode("horse rug").unwrap();
        let b = enc.encode("rug horse").unwrap();
        // "horse" sits at row 1 in `a` and row 2 in `b` (row 0 is BOS)
        let moved = cosine(a.row(1), b.row(2));
        assert!(moved > 0.7, "same word drifted too far: {}", moved);
        assert!(moved < 0.9999, "position had no effect");
        assert_eq!(a.row(0), b.row(0));
    }

    #[test]
    fn test_long_prompt_is_truncated_and_empty_prompt_pads() {
        let enc = encoder();
        let long = "a b c d e f g h i j k l m n o p";
        assert_eq!(enc.encode(long).unwrap().shape(), (8, 64));
        assert_eq!(enc.encode("").unwrap().shape(), (8, 64));
    }

    #[test]
    fn test_fnv_known_value() {
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
    }
}
