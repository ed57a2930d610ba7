//! Domain types shared by the builder, the vector store and the query pipeline.

use serde::{Deserialize, Serialize};

/// How a document's text was obtained. CSV rows bypass window chunking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Text,
    Pdf,
    CsvRow,
}

/// A unit of source text read once per build. Never persisted.
///
/// `source` is the file path, suffixed with `#row<n>` for tabular rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: String,
    pub text: String,
    pub kind: DocumentKind,
}

/// A chunk of a source document that is independently embedded and retrieved.
///
/// - `source`: originating path (or row identity for CSV rows)
/// - `chunk_id`: position within the source, assigned from 0 in generation order
/// - `text`: the payload handed to the embedding model and, later, the LLM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Chunk {
    pub source: String,
    pub chunk_id: usize,
    pub text: String,
}

/// A ranked retrieval result. `score` is cosine similarity, higher is better;
/// `rank` is 1-based among the requested top-k.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Hit {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildStats {
    pub docs: usize,
    pub chunks: usize,
    pub dim: usize,
}
