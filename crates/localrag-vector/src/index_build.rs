//! Full-rebuild indexing: scan, chunk, embed, normalize, insert, persist, reload.
//!
//! Typical flow:
//! 1) Scan the data directory into documents (bad files are skipped)
//! 2) Window-chunk prose, one chunk per CSV row
//! 3) Embed every chunk with bounded concurrency, keeping chunk order
//! 4) Insert into a fresh store, persist it, then reload it into the live handle
//!
//! Any embedding failure aborts before anything is written.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use localrag_core::chunker::chunk_documents;
use localrag_core::config::validate_chunking;
use localrag_core::data_processor::DataProcessor;
use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;
use localrag_core::types::BuildStats;
use localrag_embed::normalized;
use tracing::info;

use crate::handle::StoreHandle;
use crate::store::VectorStore;

pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    processor: DataProcessor,
    artifacts_dir: PathBuf,
    concurrency: usize,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, artifacts_dir: &Path) -> Self {
        Self {
            embedder,
            processor: DataProcessor::new(),
            artifacts_dir: artifacts_dir.to_path_buf(),
            concurrency: 4,
            show_progress: false,
        }
    }

    pub fn with_processor(mut self, processor: DataProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn build(
        &self,
        handle: &StoreHandle,
        data_dir: &Path,
        chunk_size: usize,
        overlap: usize,
        embed_model: &str,
    ) -> Result<BuildStats> {
        validate_chunking(chunk_size, overlap)?;
        let started = Instant::now();

        let docs = self.processor.process_directory(data_dir);
        if docs.is_empty() {
            return Err(Error::NoDocumentsFound(data_dir.to_path_buf()));
        }
        let chunks = chunk_documents(&docs, chunk_size, overlap)?;
        info!(docs = docs.len(), chunks = chunks.len(), chunk_size, overlap, model = embed_model, "chunked corpus");

        let pb = self.progress_bar(chunks.len());
        let embedder = &self.embedder;
        let vectors: Vec<Vec<f32>> = stream::iter(chunks.iter())
            .map(|chunk| async move { embedder.embed(embed_model, &chunk.text).await.map(normalized) })
            .buffered(self.concurrency)
            .inspect_ok(|_| pb.inc(1))
            .try_collect()
            .await
            .inspect_err(|_| pb.abandon_with_message("embedding failed"))?;
        pb.finish_with_message("embedded");

        let dim = vectors.first().map_or(0, Vec::len);
        let mut store = VectorStore::new(dim).with_embed_model(embed_model);
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            store.insert(chunk, vector)?;
        }

        store.persist(&self.artifacts_dir)?;
        let live = handle.load(&self.artifacts_dir)?;
        let stats = BuildStats { docs: docs.len(), chunks: live.len(), dim: live.dim() };
        info!(
            docs = stats.docs,
            chunks = stats.chunks,
            dim = stats.dim,
            ms = started.elapsed().as_millis() as u64,
            "index build complete"
        );
        Ok(stats)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}
