use std::time::Duration;

use async_trait::async_trait;
use localrag_core::config::OllamaSettings;
use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "embeddings";

/// Client for Ollama's `/api/embeddings` endpoint.
pub struct OllamaEmbedder {
    client: Client,
    host: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(host: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::external(SERVICE, format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_settings(settings: &OllamaSettings) -> Result<Self> {
        Self::new(
            &settings.host,
            &settings.embed_model,
            Duration::from_secs(settings.embed_timeout_secs),
        )
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn default_model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.host);
        debug!(%url, model, chars = text.len(), "embedding request");
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest { model, prompt: text })
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::external(SERVICE, format!("HTTP {status}: {}", body.trim())));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::external(SERVICE, format!("failed to parse response: {e}")))?;
        match parsed.embedding {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(Error::external(SERVICE, "response missing 'embedding'")),
        }
    }
}
