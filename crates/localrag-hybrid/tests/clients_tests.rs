use std::time::Duration;

use localrag_core::error::Error;
use localrag_core::traits::{ChatModel, StructuredLookup};
use localrag_hybrid::{McpLookup, OllamaChat};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_client(server: &MockServer) -> OllamaChat {
    OllamaChat::new(&server.uri(), "llama3.1:8b", 0.5, 4096, Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn chat_posts_messages_and_options_without_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({
            "model": "llama3.1:8b",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "how do I store potatoes?"}
            ],
            "options": {"temperature": 0.5, "num_ctx": 4096},
            "stream": false
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"role": "assistant", "content": "  Cool, dark, dry.\n"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let chat = chat_client(&server);
    assert_eq!(chat.model(), "llama3.1:8b");
    let answer = chat.chat("be brief", "how do I store potatoes?").await.expect("chat");
    assert_eq!(answer, "Cool, dark, dry.");
}

#[tokio::test]
async fn chat_non_success_is_an_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model 'llama3.1:8b' not found"))
        .mount(&server)
        .await;

    let err = chat_client(&server).chat("s", "u").await.unwrap_err();
    assert!(matches!(err, Error::ExternalService { service: "chat", .. }));
    let msg = err.to_string();
    assert!(msg.contains("404") && msg.contains("not found"), "{msg}");
}

#[tokio::test]
async fn chat_reply_without_message_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let err = chat_client(&server).chat("s", "u").await.unwrap_err();
    assert!(err.to_string().contains("missing 'message'"), "{err}");
}

#[tokio::test]
async fn chat_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"content": "late"}}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let chat = OllamaChat::new(&server.uri(), "m", 0.5, 1024, Duration::from_millis(50)).expect("client");
    let err = chat.chat("s", "u").await.unwrap_err();
    assert!(matches!(err, Error::ExternalService { service: "chat", .. }));
}

#[tokio::test]
async fn lookup_posts_named_tool_call_and_returns_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp/call"))
        .and(body_json(json!({"name": "sql.order_lookup", "arguments": {"name": "Emre Akkus", "limit": 5}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "result": [{"order_id": 7, "item": "solar kit"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = McpLookup::new(&format!("{}/mcp/", server.uri()), Duration::from_secs(5)).expect("client");
    let result = lookup
        .call("sql.order_lookup", json!({"name": "Emre Akkus", "limit": 5}))
        .await
        .expect("call");
    assert_eq!(result, json!([{"order_id": 7, "item": "solar kit"}]));
}

#[tokio::test]
async fn lookup_ok_with_empty_result_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp/call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "result": []})))
        .mount(&server)
        .await;

    let lookup = McpLookup::new(&format!("{}/mcp", server.uri()), Duration::from_secs(5)).expect("client");
    assert_eq!(lookup.call("sql.order_lookup", json!({})).await.expect("call"), json!([]));
}

#[tokio::test]
async fn lookup_error_status_surfaces_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp/call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "error", "error": "no such table"})))
        .mount(&server)
        .await;

    let lookup = McpLookup::new(&format!("{}/mcp", server.uri()), Duration::from_secs(5)).expect("client");
    let err = lookup.call("sql.order_lookup", Value::Null).await.unwrap_err();
    assert!(matches!(err, Error::ExternalService { service: "lookup", .. }));
    assert!(err.to_string().contains("no such table"), "{err}");
}

#[tokio::test]
async fn lookup_error_without_reason_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp/call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "failed"})))
        .mount(&server)
        .await;

    let lookup = McpLookup::new(&format!("{}/mcp", server.uri()), Duration::from_secs(5)).expect("client");
    let err = lookup.call("sql.order_lookup", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("unknown error"), "{err}");
}

#[tokio::test]
async fn lookup_http_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp/call"))
        .respond_with(ResponseTemplate::new(500).set_body_string("bridge crashed"))
        .mount(&server)
        .await;

    let lookup = McpLookup::new(&format!("{}/mcp", server.uri()), Duration::from_secs(5)).expect("client");
    let err = lookup.call("sql.order_lookup", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("bridge crashed"), "{err}");
}
