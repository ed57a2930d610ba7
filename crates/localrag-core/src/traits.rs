use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Text-to-vector service. Implementations return raw vectors; callers normalize.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model used when the caller does not name one.
    fn default_model(&self) -> &str;
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;
}

/// Opaque text-in/text-out chat completion service.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model(&self) -> &str;
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Named-tool structured lookup (key/value query service).
#[async_trait]
pub trait StructuredLookup: Send + Sync {
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value>;
}

pub trait PdfExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String>;
}
