use std::hash::{Hash, Hasher};

use anyhow::Result;
use prophet_core::traits::Embedder;
use twox_hash::XxHash64;

/// Deterministic bag-of-words embedder for offline runs and tests.
///
/// Each lowercased alphanumeric token is hashed into one of `dim` buckets;
/// the result is L2-normalized, so texts sharing words score high under
/// cosine similarity.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>> {
        anyhow::ensure!(self.dim > 0, "embedding dimension must be positive");
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}
