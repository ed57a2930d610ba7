use std::path::Path;
use std::sync::Arc;

use localrag_core::error::Result;
use localrag_core::traits::Embedder;
use localrag_core::types::Hit;
use localrag_embed::normalized;
use tracing::debug;

use crate::handle::StoreHandle;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Query-time side of the index: embed, search, map ids back to chunks.
pub struct Retriever {
    handle: Arc<StoreHandle>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(handle: Arc<StoreHandle>, embedder: Arc<dyn Embedder>) -> Self {
        Self { handle, embedder }
    }

    /// Top-k hits for `query`. Fails with `IndexNotLoaded` when no index is active.
    ///
    /// The query is embedded with the model recorded in the index so build and
    /// query vectors live in the same space.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        let store = self.handle.get()?;
        let model = store.embed_model().unwrap_or_else(|| self.embedder.default_model());
        let q = normalized(self.embedder.embed(model, query).await?);
        let ranked = store.search(&q, top_k)?;
        debug!(top_k, hits = ranked.len(), model, "vector search");
        Ok(ranked
            .into_iter()
            .enumerate()
            .filter_map(|(i, (id, score))| {
                store.chunk(id).map(|chunk| Hit { chunk: chunk.clone(), score, rank: i + 1 })
            })
            .collect())
    }
}

/// Render hits as the grounding block handed to the LLM:
/// `[<file>#chunk<n>] (score=0.123)` then the chunk text, blocks separated by `---`.
pub fn build_context(hits: &[Hit]) -> String {
    hits.iter()
        .map(|h| {
            let name = Path::new(&h.chunk.source)
                .file_name()
                .map_or_else(|| h.chunk.source.clone(), |n| n.to_string_lossy().to_string());
            format!("[{name}#chunk{}] (score={:.3})\n{}", h.chunk.chunk_id, h.score, h.chunk.text)
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
