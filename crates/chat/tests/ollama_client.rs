use httpmock::prelude::*;
use hyflux_chat::{ChatError, OllamaClient, DEFAULT_MODELS};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn chat_extracts_yaml_from_reply() {
    let server = MockServer::start_async().await;
    let reply = "Sure!\n```yaml\nslides:\n  - type: quote\n    quote: Hi\n```\nAnything else?";
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .json_body_partial(r#"{"model": "mistral", "stream": false}"#);
            then.status(200).json_body(json!({ "response": reply, "done": true }));
        })
        .await;

    let client = OllamaClient::new(server.base_url());
    let exchange = client.chat("Make me a quote slide", Some("mistral")).await.unwrap();

    mock.assert_async().await;
    assert_eq!(exchange.model_id, "mistral");
    assert_eq!(exchange.raw_response, reply);
    assert_eq!(
        exchange.extracted_yaml.as_deref(),
        Some("slides:\n  - type: quote\n    quote: Hi")
    );
}

#[tokio::test]
async fn prompt_carries_context_and_message() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("PowerPoint presentations using YAML")
                .body_contains("How many slides?");
            then.status(200).json_body(json!({ "response": "Ten." }));
        })
        .await;

    let client = OllamaClient::new(server.base_url());
    let exchange = client.chat("How many slides?", None).await.unwrap();

    mock.assert_async().await;
    assert_eq!(exchange.model_id, "llama3.2");
    assert_eq!(exchange.extracted_yaml, None);
}

#[tokio::test]
async fn missing_model_maps_to_status_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(404).body("model 'nope' not found");
        })
        .await;

    let client = OllamaClient::new(server.base_url());
    let err = client.chat("hello", Some("nope")).await.unwrap_err();
    assert!(matches!(err, ChatError::Status { status: 404, .. }));
    assert_eq!(err.suggestions(), vec!["Pull the model first: `ollama pull nope`"]);
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let client = OllamaClient::new(server.base_url());
    assert!(matches!(
        client.chat("hello", None).await,
        Err(ChatError::Decode(_))
    ));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({ "response": "late" }));
        })
        .await;

    let client = OllamaClient::new(server.base_url())
        .with_timeouts(Duration::from_millis(50), Duration::from_millis(50));
    assert!(matches!(
        client.chat("hello", None).await,
        Err(ChatError::Timeout { .. })
    ));
}

#[tokio::test]
async fn connection_refused_is_reported_with_suggestions() {
    let client = OllamaClient::new("http://127.0.0.1:1");
    let err = client.chat("hello", None).await.unwrap_err();
    assert!(matches!(err, ChatError::Connection { .. }));
    assert!(!err.suggestions().is_empty());

    assert!(client.test_connection().await.is_err());
}

#[tokio::test]
async fn list_models_reads_tags() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [{ "name": "llama3.2:latest" }, { "name": "phi3" }]
            }));
        })
        .await;

    let client = OllamaClient::new(server.base_url());
    assert_eq!(client.list_models().await, vec!["llama3.2:latest", "phi3"]);
    assert_eq!(client.test_connection().await.unwrap(), server.base_url());
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn list_models_falls_back_to_defaults() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({ "models": [] }));
        })
        .await;
    let client = OllamaClient::new(server.base_url());
    assert_eq!(client.list_models().await, DEFAULT_MODELS.to_vec());

    let offline = OllamaClient::new("http://127.0.0.1:1");
    assert_eq!(offline.list_models().await, DEFAULT_MODELS.to_vec());
}
