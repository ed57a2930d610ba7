//! Fixed prompt text. Answers are only reproducible if these stay byte-stable.

use serde_json::Value;

pub const SYSTEM_PROMPT_RAG: &str = "You answer strictly from the provided context. \
If the context is insufficient, say you don't have enough information. \
Cite sources inline like [filename#chunkN]. Be concise.";

pub const SYSTEM_PROMPT_BARE: &str = "You are a helpful assistant. Answer concisely. If unsure, say so.";

pub const SYSTEM_PROMPT_EXTRACT: &str = "You extract the CUSTOMER NAME from user questions about orders.\n\
If no name is clearly mentioned, respond with just: null\n\
Otherwise, return only the name string (e.g. Emre Akkus).";

pub const SYSTEM_PROMPT_FUSE: &str =
    "You are a helpful assistant combining structured and unstructured information.";

/// Responses that mean "no entity in this question".
const NO_ENTITY: [&str; 2] = ["null", "none"];

/// Interpret the extractor's reply. `None` for the sentinel or blank output,
/// otherwise the trimmed reply verbatim.
pub fn parse_entity(reply: &str) -> Option<String> {
    let name = reply.trim();
    if name.is_empty() || NO_ENTITY.iter().any(|s| name.eq_ignore_ascii_case(s)) {
        return None;
    }
    Some(name.to_string())
}

pub fn rag_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion:\n{question}")
}

pub fn fuse_prompt(structured: &Value, context: &str, question: &str) -> String {
    let structured = serde_json::to_string_pretty(structured).unwrap_or_else(|_| "null".to_string());
    format!(
        "Structured data (from MCP):\n{structured}\n\n\
         Unstructured context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Answer concisely using both sources."
    )
}
