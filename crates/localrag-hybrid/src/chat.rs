use std::time::Duration;

use async_trait::async_trait;
use localrag_core::config::OllamaSettings;
use localrag_core::error::{Error, Result};
use localrag_core::traits::ChatModel;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "chat";

/// Non-streaming client for Ollama's `/api/chat`.
pub struct OllamaChat {
    client: Client,
    host: String,
    model: String,
    temperature: f32,
    num_ctx: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    options: ChatOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaChat {
    pub fn new(host: &str, model: &str, temperature: f32, num_ctx: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::external(SERVICE, format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            num_ctx,
        })
    }

    pub fn from_settings(settings: &OllamaSettings) -> Result<Self> {
        Self::new(
            &settings.host,
            &settings.llm_model,
            settings.temperature,
            settings.num_ctx,
            Duration::from_secs(settings.chat_timeout_secs),
        )
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.host);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                Message { role: "system", content: system_prompt },
                Message { role: "user", content: user_prompt },
            ],
            options: ChatOptions { temperature: self.temperature, num_ctx: self.num_ctx },
            stream: false,
        };
        debug!(%url, model = %self.model, prompt_chars = user_prompt.len(), "chat request");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::external(SERVICE, format!("HTTP {status}: {}", text.trim())));
        }
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::external(SERVICE, format!("failed to parse response: {e}")))?;
        parsed
            .message
            .map(|m| m.content.trim().to_string())
            .ok_or_else(|| Error::external(SERVICE, "response missing 'message'"))
    }
}
