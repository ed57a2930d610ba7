//! localrag-hybrid
//!
//! Chat and structured-lookup clients, the hybrid query pipeline, the
//! RAG-vs-bare comparator, and `RagService`, the facade the CLI drives.

pub mod chat;
pub mod compare;
pub mod lookup;
pub mod pipeline;
pub mod prompts;
pub mod service;

pub use chat::OllamaChat;
pub use compare::{compare, Comparison};
pub use lookup::McpLookup;
pub use pipeline::{HybridPipeline, HybridQueryState, Stage};
pub use service::{BuildOptions, IndexStatus, RagService};
