use std::time::Duration;

use async_trait::async_trait;
use localrag_core::config::LookupSettings;
use localrag_core::error::{Error, Result};
use localrag_core::traits::StructuredLookup;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "lookup";

/// Named-tool client for an MCP-style bridge: `POST {base_url}/call`.
pub struct McpLookup {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ToolCall<'a> {
    name: &'a str,
    arguments: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ToolReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl McpLookup {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::external(SERVICE, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn from_settings(settings: &LookupSettings) -> Result<Self> {
        Self::new(&settings.base_url, Duration::from_secs(settings.timeout_secs))
    }
}

#[async_trait]
impl StructuredLookup for McpLookup {
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value> {
        let url = format!("{}/call", self.base_url);
        debug!(%url, tool, "tool call");
        let response = self
            .client
            .post(&url)
            .json(&ToolCall { name: tool, arguments: &arguments })
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::external(SERVICE, format!("HTTP {status}: {}", text.trim())));
        }
        let reply: ToolReply = response
            .json()
            .await
            .map_err(|e| Error::external(SERVICE, format!("failed to parse response: {e}")))?;
        if reply.status.as_deref() != Some("ok") {
            let reason = reply.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(Error::external(SERVICE, format!("{tool} failed: {reason}")));
        }
        Ok(reply.result)
    }
}
