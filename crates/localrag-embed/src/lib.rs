//! localrag-embed
//!
//! Embedding adapters behind `localrag_core::traits::Embedder` plus the L2
//! normalization shared by index build and query time.

use std::sync::Arc;

use localrag_core::config::OllamaSettings;
use localrag_core::error::Result;
use tracing::info;

pub mod fake;
pub mod normalize;
pub mod ollama;

pub use fake::FakeEmbedder;
pub use localrag_core::traits::Embedder;
pub use normalize::{l2_norm, l2_normalize, normalized};
pub use ollama::OllamaEmbedder;

pub const FAKE_EMBEDDING_DIM: usize = 384;

/// `APP_USE_FAKE_EMBEDDINGS=1` swaps in the deterministic fake embedder.
pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(settings: &OllamaSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() {
        info!(dim = FAKE_EMBEDDING_DIM, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM, &settings.embed_model)));
    }
    info!(host = %settings.host, model = %settings.embed_model, "using Ollama embeddings");
    Ok(Arc::new(OllamaEmbedder::from_settings(settings)?))
}
