use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use localrag_core::error::Error;
use localrag_core::traits::{ChatModel, Embedder, StructuredLookup};
use localrag_embed::FakeEmbedder;
use localrag_hybrid::prompts::{SYSTEM_PROMPT_BARE, SYSTEM_PROMPT_EXTRACT, SYSTEM_PROMPT_FUSE, SYSTEM_PROMPT_RAG};
use localrag_hybrid::{compare, HybridPipeline};
use localrag_vector::{IndexBuilder, Retriever, StoreHandle};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Replies `extraction` to the extractor prompt and `answer` to everything else,
/// recording every (system, user) pair.
struct ScriptedChat {
    extraction: String,
    answer: String,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    fn new(extraction: &str, answer: &str) -> Arc<Self> {
        Arc::new(Self { extraction: extraction.into(), answer: answer.into(), calls: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> localrag_core::Result<String> {
        self.calls.lock().unwrap().push((system_prompt.to_string(), user_prompt.to_string()));
        if system_prompt == SYSTEM_PROMPT_EXTRACT {
            Ok(self.extraction.clone())
        } else {
            Ok(self.answer.clone())
        }
    }
}

enum LookupBehavior {
    Rows(Value),
    Fail,
}

struct RecordingLookup {
    behavior: LookupBehavior,
    calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingLookup {
    fn new(behavior: LookupBehavior) -> Arc<Self> {
        Arc::new(Self { behavior, calls: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl StructuredLookup for RecordingLookup {
    async fn call(&self, tool: &str, arguments: Value) -> localrag_core::Result<Value> {
        self.calls.lock().unwrap().push((tool.to_string(), arguments));
        match &self.behavior {
            LookupBehavior::Rows(v) => Ok(v.clone()),
            LookupBehavior::Fail => Err(Error::external("lookup", "sql.order_lookup failed: database offline")),
        }
    }
}

async fn indexed_retriever(tmp: &TempDir) -> Result<Retriever> {
    let data = tmp.path().join("data");
    fs::create_dir_all(&data)?;
    fs::write(data.join("shipping.txt"), "Orders ship within three business days from the barn warehouse.")?;
    fs::write(data.join("returns.md"), "Returns are accepted for thirty days with the original receipt.")?;

    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(32, "fake"));
    let handle = Arc::new(StoreHandle::new());
    IndexBuilder::new(Arc::clone(&embedder), &tmp.path().join("artifacts"))
        .build(&handle, &data, 1200, 200, "fake")
        .await?;
    Ok(Retriever::new(handle, embedder))
}

#[tokio::test]
async fn named_customer_gets_structured_rows_and_context() -> Result<()> {
    let tmp = TempDir::new()?;
    let chat = ScriptedChat::new("Emre Akkus", "Your order shipped.");
    let rows = json!([{"order_id": 42, "status": "shipped"}]);
    let lookup = RecordingLookup::new(LookupBehavior::Rows(rows.clone()));
    let pipeline = HybridPipeline::new(indexed_retriever(&tmp).await?, chat.clone(), lookup.clone(), "sql.order_lookup", 5);

    let state = pipeline.run("Where is Emre Akkus's order?", 2).await?;

    assert_eq!(state.customer_name.as_deref(), Some("Emre Akkus"));
    assert_eq!(state.structured_result, rows);
    assert_eq!(state.hits.len(), 2);
    assert_eq!(state.final_answer, "Your order shipped.");

    let lookups = lookup.calls.lock().unwrap().clone();
    assert_eq!(lookups, vec![("sql.order_lookup".to_string(), json!({"name": "Emre Akkus", "limit": 5}))]);

    let calls = chat.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (SYSTEM_PROMPT_EXTRACT.to_string(), "Where is Emre Akkus's order?".to_string()));
    assert_eq!(calls[1].0, SYSTEM_PROMPT_FUSE);
    assert!(calls[1].1.contains("\"order_id\": 42"));
    assert!(calls[1].1.contains(&state.unstructured_context));
    assert!(calls[1].1.ends_with("Question:\nWhere is Emre Akkus's order?\n\nAnswer concisely using both sources."));
    Ok(())
}

#[tokio::test]
async fn sentinel_skips_lookup_and_answers_from_context() -> Result<()> {
    let tmp = TempDir::new()?;
    for sentinel in ["null", "None", "  "] {
        let chat = ScriptedChat::new(sentinel, "Thirty days.");
        let lookup = RecordingLookup::new(LookupBehavior::Rows(json!([{"unexpected": true}])));
        let pipeline =
            HybridPipeline::new(indexed_retriever(&tmp).await?, chat.clone(), lookup.clone(), "sql.order_lookup", 5);

        let state = pipeline.run("How long do I have to return something?", 1).await?;

        assert!(lookup.calls.lock().unwrap().is_empty(), "lookup called for sentinel {sentinel:?}");
        assert_eq!(state.customer_name, None);
        assert!(state.structured_result.is_null());
        assert_eq!(state.hits.len(), 1);
        assert_eq!(state.final_answer, "Thirty days.");
        assert!(chat.calls()[1].1.starts_with("Structured data (from MCP):\nnull\n\n"));
    }
    Ok(())
}

#[tokio::test]
async fn lookup_failure_degrades_to_empty_structured_section() -> Result<()> {
    let tmp = TempDir::new()?;
    let chat = ScriptedChat::new("Ada Lovelace", "No order data, but shipping takes three days.");
    let lookup = RecordingLookup::new(LookupBehavior::Fail);
    let pipeline = HybridPipeline::new(indexed_retriever(&tmp).await?, chat.clone(), lookup.clone(), "sql.order_lookup", 5);

    let state = pipeline.run("When will Ada Lovelace get her order?", 2).await?;

    assert_eq!(lookup.calls.lock().unwrap().len(), 1);
    assert_eq!(state.customer_name.as_deref(), Some("Ada Lovelace"));
    assert!(state.structured_result.is_null());
    assert_eq!(state.hits.len(), 2);
    assert_eq!(state.final_answer, "No order data, but shipping takes three days.");
    Ok(())
}

#[tokio::test]
async fn retrieval_errors_propagate() -> Result<()> {
    let chat = ScriptedChat::new("null", "unused");
    let lookup = RecordingLookup::new(LookupBehavior::Rows(Value::Null));
    let retriever = Retriever::new(Arc::new(StoreHandle::new()), Arc::new(FakeEmbedder::new(8, "fake")));
    let pipeline = HybridPipeline::new(retriever, chat.clone(), lookup, "sql.order_lookup", 5);

    let err = pipeline.run("anything", 3).await.unwrap_err();
    assert!(matches!(err, Error::IndexNotLoaded), "{err}");
    // Extraction ran; generation did not.
    assert_eq!(chat.calls().len(), 1);
    Ok(())
}

struct BrokenChat;

#[async_trait]
impl ChatModel for BrokenChat {
    fn model(&self) -> &str {
        "broken"
    }

    async fn chat(&self, _system_prompt: &str, _user_prompt: &str) -> localrag_core::Result<String> {
        Err(Error::external("chat", "HTTP 503 Service Unavailable: model loading"))
    }
}

#[tokio::test]
async fn chat_errors_propagate() -> Result<()> {
    let tmp = TempDir::new()?;
    let lookup = RecordingLookup::new(LookupBehavior::Rows(Value::Null));
    let pipeline = HybridPipeline::new(indexed_retriever(&tmp).await?, Arc::new(BrokenChat), lookup, "sql.order_lookup", 5);

    let err = pipeline.run("Where is my order?", 2).await.unwrap_err();
    assert!(matches!(err, Error::ExternalService { service: "chat", .. }), "{err}");
    Ok(())
}

#[tokio::test]
async fn comparison_runs_grounded_and_bare_prompts() -> Result<()> {
    let tmp = TempDir::new()?;
    let retriever = indexed_retriever(&tmp).await?;
    let chat = ScriptedChat::new("null", "an answer");

    let cmp = compare(&retriever, chat.as_ref(), "fake", "How fast do orders ship?", 2).await?;

    assert_eq!(cmp.rag.answer, "an answer");
    assert_eq!(cmp.llm.answer, "an answer");
    assert_eq!(cmp.rag.chunks.len(), 2);
    assert_eq!((cmp.used.model.as_str(), cmp.used.embed.as_str(), cmp.used.top_k), ("scripted", "fake", 2));

    let calls = chat.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, SYSTEM_PROMPT_RAG);
    assert!(calls[0].1.starts_with("Context:\n["));
    assert!(calls[0].1.ends_with("Question:\nHow fast do orders ship?"));
    assert_eq!(calls[1], (SYSTEM_PROMPT_BARE.to_string(), "How fast do orders ship?".to_string()));

    let json = serde_json::to_value(&cmp)?;
    assert!(json["latency_ms"]["retrieve"].is_u64());
    assert!(json["rag"]["chunks"][0]["source"].is_string());
    assert!(json["rag"]["chunks"][0]["score"].is_number());
    Ok(())
}
