//! Hybrid question answering: structured lookup fused with vector retrieval.
//!
//! Stages run strictly in order:
//! `ExtractEntity -> (StructuredLookup | Skip) -> VectorRetrieve -> FuseAndGenerate`.
//! Retrieval always runs; the structured path only ever adds context.

use std::sync::Arc;

use localrag_core::error::Result;
use localrag_core::traits::{ChatModel, StructuredLookup};
use localrag_core::types::Hit;
use localrag_vector::{build_context, Retriever};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::prompts::{fuse_prompt, parse_entity, SYSTEM_PROMPT_EXTRACT, SYSTEM_PROMPT_FUSE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractEntity,
    StructuredLookup,
    Skip,
    VectorRetrieve,
    FuseAndGenerate,
}

/// Everything one hybrid query produced, in stage order.
#[derive(Debug, Clone, Serialize)]
pub struct HybridQueryState {
    pub question: String,
    pub customer_name: Option<String>,
    /// Lookup result; `null` when skipped or when the lookup failed.
    pub structured_result: Value,
    pub hits: Vec<Hit>,
    pub unstructured_context: String,
    pub final_answer: String,
}

pub struct HybridPipeline {
    retriever: Retriever,
    chat: Arc<dyn ChatModel>,
    lookup: Arc<dyn StructuredLookup>,
    tool: String,
    row_limit: usize,
}

impl HybridPipeline {
    pub fn new(
        retriever: Retriever,
        chat: Arc<dyn ChatModel>,
        lookup: Arc<dyn StructuredLookup>,
        tool: &str,
        row_limit: usize,
    ) -> Self {
        Self { retriever, chat, lookup, tool: tool.to_string(), row_limit }
    }

    pub async fn run(&self, question: &str, top_k: usize) -> Result<HybridQueryState> {
        debug!(stage = ?Stage::ExtractEntity, "hybrid query");
        let customer_name = self.extract_entity(question).await?;

        let structured_result = match &customer_name {
            Some(name) => {
                debug!(stage = ?Stage::StructuredLookup, %name, "hybrid query");
                self.lookup(name).await
            }
            None => {
                debug!(stage = ?Stage::Skip, "no entity in question");
                Value::Null
            }
        };

        debug!(stage = ?Stage::VectorRetrieve, top_k, "hybrid query");
        let hits = self.retriever.retrieve(question, top_k).await?;
        let unstructured_context = build_context(&hits);

        debug!(stage = ?Stage::FuseAndGenerate, "hybrid query");
        let prompt = fuse_prompt(&structured_result, &unstructured_context, question);
        let final_answer = self.chat.chat(SYSTEM_PROMPT_FUSE, &prompt).await?;

        info!(
            entity = customer_name.as_deref().unwrap_or("-"),
            structured = !structured_result.is_null(),
            hits = hits.len(),
            "hybrid query answered"
        );
        Ok(HybridQueryState {
            question: question.to_string(),
            customer_name,
            structured_result,
            hits,
            unstructured_context,
            final_answer,
        })
    }

    /// Ask the chat model for the customer name in `question`, if any.
    pub async fn extract_entity(&self, question: &str) -> Result<Option<String>> {
        let reply = self.chat.chat(SYSTEM_PROMPT_EXTRACT, question).await?;
        Ok(parse_entity(&reply))
    }

    /// Structured rows for `name`. Failures are logged and yield `null`.
    pub async fn lookup(&self, name: &str) -> Value {
        let args = json!({ "name": name, "limit": self.row_limit });
        match self.lookup.call(&self.tool, args).await {
            Ok(v) => v,
            Err(e) => {
                warn!(tool = %self.tool, error = %e, "structured lookup failed; continuing without it");
                Value::Null
            }
        }
    }
}
