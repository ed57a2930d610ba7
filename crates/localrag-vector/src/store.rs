use std::cmp::Ordering;

use localrag_core::error::{Error, Result};
use localrag_core::types::Chunk;
use localrag_embed::normalize::{is_unit, l2_normalize};

/// Vectors within this distance of unit norm are stored as given.
pub const UNIT_TOLERANCE: f64 = 1e-4;

/// Flat (exact) cosine index: every query scans every stored vector.
///
/// Vectors are kept row-major in one buffer; row `i` belongs to `chunks[i]`
/// and `i` is the entry's internal id for the lifetime of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStore {
    dim: usize,
    embed_model: Option<String>,
    vectors: Vec<f32>,
    chunks: Vec<Chunk>,
}

impl VectorStore {
    pub fn new(dim: usize) -> Self {
        Self { dim, embed_model: None, vectors: Vec::new(), chunks: Vec::new() }
    }

    /// Record which embedding model produced the vectors, so queries can use the same one.
    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = Some(model.into());
        self
    }

    pub(crate) fn from_parts(
        dim: usize,
        embed_model: Option<String>,
        vectors: Vec<f32>,
        chunks: Vec<Chunk>,
    ) -> Self {
        debug_assert_eq!(vectors.len(), dim * chunks.len());
        Self { dim, embed_model, vectors, chunks }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn embed_model(&self) -> Option<&str> {
        self.embed_model.as_deref()
    }

    pub fn chunk(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        (id < self.len()).then(|| self.row(id))
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }

    fn row(&self, id: usize) -> &[f32] {
        &self.vectors[id * self.dim..(id + 1) * self.dim]
    }

    /// Append an entry and return its internal id. The vector is normalized
    /// here if the caller did not already do so.
    pub fn insert(&mut self, chunk: Chunk, mut vector: Vec<f32>) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        if !is_unit(&vector, UNIT_TOLERANCE) {
            l2_normalize(&mut vector);
        }
        let id = self.chunks.len();
        self.vectors.extend_from_slice(&vector);
        self.chunks.push(chunk);
        Ok(id)
    }

    /// Exact top-k by inner product: `min(top_k, len)` pairs of
    /// `(internal_id, score)`, best first, equal scores by ascending id.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        if top_k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let mut q = query.to_vec();
        if !is_unit(&q, UNIT_TOLERANCE) {
            l2_normalize(&mut q);
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len()).map(|id| (id, dot(&q, self.row(id)))).collect();
        let k = top_k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_score_then_id);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_score_then_id);
        Ok(scored)
    }
}

fn by_score_then_id(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
