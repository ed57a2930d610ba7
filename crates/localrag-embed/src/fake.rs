use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use localrag_core::error::Result;
use localrag_core::traits::Embedder;
use twox_hash::XxHash64;

/// Hashed bag-of-words vectors. Deterministic per (model, text), so texts
/// that share words score higher than unrelated ones. Not normalized.
pub struct FakeEmbedder {
    dim: usize,
    model: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize, model: &str) -> Self {
        Self { dim, model: model.to_string() }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn vector_for(&self, model: &str, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            model.hash(&mut hasher);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 1.0 + val + (i as f32 % 3.0) * 0.01;
        }
        v
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn default_model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(model, text))
    }
}
