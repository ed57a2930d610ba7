use std::path::PathBuf;
use std::sync::Arc;

use localrag_core::config::Settings;
use localrag_core::data_processor::{ingest_files, list_data_files, reset_dir, DataFile};
use localrag_core::error::Result;
use localrag_core::traits::{ChatModel, Embedder, StructuredLookup};
use localrag_core::types::{BuildStats, Hit};
use localrag_embed::get_default_embedder;
use localrag_vector::{meta_len, IndexBuilder, IndexPaths, Retriever, StoreHandle};
use serde::Serialize;
use tracing::info;

use crate::chat::OllamaChat;
use crate::compare::{compare, Comparison};
use crate::lookup::McpLookup;
use crate::pipeline::{HybridPipeline, HybridQueryState};

/// Overrides for a single build; `None` falls back to settings.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub chunk_size: Option<usize>,
    pub overlap: Option<usize>,
    pub embed_model: Option<String>,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub index_exists: bool,
    pub index_loaded: bool,
    pub meta_len: usize,
    pub generation: Option<String>,
    pub data_dir: PathBuf,
    pub vectors_path: PathBuf,
    pub meta_path: PathBuf,
    pub llm_model: String,
    pub embed_model: String,
}

/// Process-level facade: owns the settings, the active index handle and the
/// external collaborators, and exposes every user-facing operation.
pub struct RagService {
    settings: Settings,
    handle: Arc<StoreHandle>,
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    lookup: Arc<dyn StructuredLookup>,
}

impl RagService {
    pub fn new(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        lookup: Arc<dyn StructuredLookup>,
    ) -> Self {
        Self { settings, handle: Arc::new(StoreHandle::new()), embedder, chat, lookup }
    }

    /// Wire the Ollama and MCP clients described by `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = get_default_embedder(&settings.ollama)?;
        let chat = Arc::new(OllamaChat::from_settings(&settings.ollama)?);
        let lookup = Arc::new(McpLookup::from_settings(&settings.lookup)?);
        Ok(Self::new(settings, embedder, chat, lookup))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.handle
    }

    /// Rebuild the index from the data directory and make it active.
    pub async fn build(&self, opts: BuildOptions) -> Result<BuildStats> {
        let chunk_size = opts.chunk_size.unwrap_or(self.settings.index.chunk_size);
        let overlap = opts.overlap.unwrap_or(self.settings.index.overlap);
        let model = opts.embed_model.as_deref().unwrap_or(&self.settings.ollama.embed_model);
        IndexBuilder::new(Arc::clone(&self.embedder), &self.settings.artifacts_dir())
            .with_concurrency(self.settings.index.embed_concurrency)
            .with_progress(opts.show_progress)
            .build(&self.handle, &self.settings.data_dir(), chunk_size, overlap, model)
            .await
    }

    /// Load the persisted index if nothing is active yet.
    pub fn ensure_loaded(&self) -> Result<()> {
        self.handle.ensure_loaded(&self.settings.artifacts_dir()).map(|_| ())
    }

    pub fn retriever(&self) -> Retriever {
        Retriever::new(Arc::clone(&self.handle), Arc::clone(&self.embedder))
    }

    pub async fn search(&self, question: &str, top_k: usize) -> Result<Vec<Hit>> {
        self.ensure_loaded()?;
        self.retriever().retrieve(question, top_k).await
    }

    /// Hybrid answer: structured lookup (when a customer is named) plus retrieved context.
    pub async fn query(&self, question: &str, top_k: usize) -> Result<HybridQueryState> {
        self.ensure_loaded()?;
        let pipeline = HybridPipeline::new(
            self.retriever(),
            Arc::clone(&self.chat),
            Arc::clone(&self.lookup),
            &self.settings.lookup.tool,
            self.settings.lookup.row_limit,
        );
        pipeline.run(question, top_k).await
    }

    /// Grounded answer next to the bare model's answer for the same question.
    pub async fn compare(&self, question: &str, top_k: usize) -> Result<Comparison> {
        self.ensure_loaded()?;
        let embed = self.active_embed_model();
        compare(&self.retriever(), self.chat.as_ref(), &embed, question, top_k).await
    }

    pub fn status(&self) -> IndexStatus {
        let artifacts = self.settings.artifacts_dir();
        let paths = IndexPaths::new(&artifacts);
        IndexStatus {
            index_exists: paths.exists(),
            index_loaded: self.handle.is_loaded(),
            meta_len: meta_len(&artifacts),
            data_dir: self.settings.data_dir(),
            generation: paths.generation,
            vectors_path: paths.vectors,
            meta_path: paths.meta,
            llm_model: self.chat.model().to_string(),
            embed_model: self.active_embed_model(),
        }
    }

    pub fn list_files(&self) -> Vec<DataFile> {
        list_data_files(&self.settings.data_dir())
    }

    pub fn ingest(&self, files: &[PathBuf]) -> Result<Vec<DataFile>> {
        let saved = ingest_files(&self.settings.data_dir(), files)?;
        info!(saved = saved.len(), "ingested files");
        Ok(saved)
    }

    /// Empty both the data and artifacts directories and drop the active index.
    pub fn clear(&self) -> Result<()> {
        reset_dir(&self.settings.data_dir())?;
        reset_dir(&self.settings.artifacts_dir())?;
        self.handle.unload();
        info!("cleared data and artifacts");
        Ok(())
    }

    /// Model the active index was built with, else the configured one.
    fn active_embed_model(&self) -> String {
        self.handle
            .get()
            .ok()
            .and_then(|s| s.embed_model().map(str::to_string))
            .unwrap_or_else(|| self.settings.ollama.embed_model.clone())
    }
}
