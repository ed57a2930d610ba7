use std::time::Instant;

use localrag_core::error::Result;
use localrag_core::traits::ChatModel;
use localrag_core::types::Hit;
use localrag_vector::{build_context, Retriever};
use serde::Serialize;
use tracing::info;

use crate::prompts::{rag_prompt, SYSTEM_PROMPT_BARE, SYSTEM_PROMPT_RAG};

/// Side-by-side answers to one question: grounded in retrieved chunks vs. the bare model.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub rag: RagAnswer,
    pub llm: LlmAnswer,
    pub used: Used,
    pub latency_ms: Latency,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub chunks: Vec<Hit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Used {
    pub model: String,
    pub embed: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Latency {
    pub retrieve: u64,
    pub rag: u64,
    pub llm: u64,
}

pub async fn compare(
    retriever: &Retriever,
    chat: &dyn ChatModel,
    embed_model: &str,
    question: &str,
    top_k: usize,
) -> Result<Comparison> {
    let t0 = Instant::now();
    let hits = retriever.retrieve(question, top_k).await?;
    let retrieve = elapsed_ms(t0);

    let t1 = Instant::now();
    let context = build_context(&hits);
    let rag_answer = chat.chat(SYSTEM_PROMPT_RAG, &rag_prompt(&context, question)).await?;
    let rag = elapsed_ms(t1);

    let t2 = Instant::now();
    let bare_answer = chat.chat(SYSTEM_PROMPT_BARE, question).await?;
    let llm = elapsed_ms(t2);

    info!(hits = hits.len(), retrieve, rag, llm, "comparison done");
    Ok(Comparison {
        rag: RagAnswer { answer: rag_answer, chunks: hits },
        llm: LlmAnswer { answer: bare_answer },
        used: Used { model: chat.model().to_string(), embed: embed_model.to_string(), top_k },
        latency_ms: Latency { retrieve, rag, llm },
    })
}

fn elapsed_ms(t: Instant) -> u64 {
    u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX)
}
