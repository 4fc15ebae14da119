//! Endpoint tests over the full router.

use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use httpmock::prelude::*;
use hyflux_chat::OllamaClient;
use hyflux_core::GeneratorConfig;
use hyflux_pptx::fixture;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::{router, AppState};

const DECK: &str = "presentation:\n  title: Quarterly Review\nslides:\n  - type: title_white\n    title: Q1\n    subtitle: Results\n  - type: text_only\n    title: Highlights\n    content: Revenue up\n  - type: end_slide\n";

fn state_in(dir: &Path, ollama_url: &str) -> AppState {
    let template = dir.join("templates").join("HyFlux_Template_-.pptx");
    fixture::write_template(&template, 36).unwrap();
    AppState {
        template: Some(template),
        config: Arc::new(GeneratorConfig::default()),
        output_dir: dir.join("output"),
        upload_dir: dir.join("uploads"),
        saved_dir: dir.join("saved"),
        sample: None,
        chat: OllamaClient::new(ollama_url),
    }
}

/// Server whose Ollama backend refuses connections.
fn create_test_server() -> (TempDir, TestServer) {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(dir.path(), "http://127.0.0.1:1");
    (dir, TestServer::new(router(state)).unwrap())
}

#[tokio::test]
async fn test_health_returns_200() {
    let (_dir, server) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "hyflux-server");
}

#[tokio::test]
async fn test_template_falls_back_to_builtin_sample() {
    let (_dir, server) = create_test_server();
    let json = server.get("/api/template").await.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["content"], hyflux_core::spec::SAMPLE_SPEC);
}

#[tokio::test]
async fn test_template_serves_configured_sample() {
    let dir = tempfile::tempdir().unwrap();
    let sample = dir.path().join("sample_content_spec.yaml");
    std::fs::write(&sample, "slides: []\n").unwrap();
    let mut state = state_in(dir.path(), "http://127.0.0.1:1");
    state.sample = Some(sample);
    let server = TestServer::new(router(state)).unwrap();

    let json = server.get("/api/template").await.json::<Value>();
    assert_eq!(json["content"], "slides: []\n");
}

#[tokio::test]
async fn test_validate_accepts_spec_with_warnings() {
    let (_dir, server) = create_test_server();
    let response = server
        .post("/api/validate")
        .json(&json!({ "yaml": "slides:\n  - type: quote\n  - type: end_slide\n" }))
        .await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Valid YAML with 2 slides");
    assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_validate_rejects_unknown_type() {
    let (_dir, server) = create_test_server();
    let response = server
        .post("/api/validate")
        .json(&json!({ "yaml": "slides:\n  - type: hologram\n" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Validation errors:"));
    assert!(error.contains("hologram"));
}

#[tokio::test]
async fn test_validate_rejects_bad_yaml_and_shape() {
    let (_dir, server) = create_test_server();
    for yaml in ["slides: [unclosed", "- just\n- a list\n", "title: no slides\n"] {
        let response = server.post("/api/validate").json(&json!({ "yaml": yaml })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }
}

#[tokio::test]
async fn test_malformed_json_gets_uniform_error_body() {
    let (_dir, server) = create_test_server();
    let response = server
        .post("/api/generate")
        .content_type("application/json")
        .text("{not json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_generate_download_and_report() {
    let (_dir, server) = create_test_server();
    let response = server.post("/api/generate").json(&json!({ "yaml": DECK })).await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["slide_count"], 3);
    assert_eq!(json["message"], "Generated 3 slides");
    let filename = json["filename"].as_str().unwrap().to_string();
    assert!(filename.contains("_Quarterly_Review_"), "{}", filename);
    assert!(filename.ends_with(".pptx"));

    let download = server.get(&format!("/api/download/{}", filename)).await;
    download.assert_status_ok();
    assert_eq!(
        download.header("content-type"),
        "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    );
    assert!(download
        .header("content-disposition")
        .to_str()
        .unwrap()
        .starts_with("attachment"));
    assert_eq!(&download.as_bytes()[..2], b"PK");

    let report = server.get(&format!("/api/report/{}", filename)).await;
    report.assert_status_ok();
    let report = report.json::<Value>();
    assert_eq!(report["passed"], true);
    assert_eq!(report["checks"][0]["name"], "slide_count");
    assert_eq!(report["checks"][0]["detail"], "3 slides");
}

#[tokio::test]
async fn test_generate_without_template_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = state_in(dir.path(), "http://127.0.0.1:1");
    state.template = Some(dir.path().join("missing.pptx"));
    let server = TestServer::new(router(state)).unwrap();

    let response = server.post("/api/generate").json(&json!({ "yaml": DECK })).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("Template file not found"));
}

#[tokio::test]
async fn test_download_unknown_file_is_404() {
    let (_dir, server) = create_test_server();
    for path in ["/api/download/nope.pptx", "/api/download/..%2F..%2Fetc%2Fpasswd"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "File not found");
    }
}

#[tokio::test]
async fn test_save_list_and_load() {
    let (_dir, server) = create_test_server();
    let response = server
        .post("/api/save")
        .json(&json!({ "yaml": DECK, "filename": "../q1 review" }))
        .await;
    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["filename"], "q1_review.yaml");

    let listing = server.get("/api/saved-files").await.json::<Value>();
    let files = listing["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filename"], "q1_review.yaml");
    assert_eq!(files[0]["size"], DECK.len());

    let loaded = server.get("/api/load-file/q1_review.yaml").await.json::<Value>();
    assert_eq!(loaded["content"], DECK);

    server
        .get("/api/load-file/other.yaml")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_requires_content() {
    let (_dir, server) = create_test_server();
    server
        .post("/api/save")
        .json(&json!({ "yaml": "  ", "filename": "x" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_stores_yaml() {
    let (dir, server) = create_test_server();
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(DECK.as_bytes().to_vec())
            .file_name("deck.yaml")
            .mime_type("application/x-yaml"),
    );
    let response = server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["content"], DECK);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("uploads").join("deck.yaml")).unwrap(),
        DECK
    );
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension_and_bad_yaml() {
    let (_dir, server) = create_test_server();

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"slides: []".to_vec()).file_name("deck.txt"));
    let response = server.post("/api/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains(".yaml or .yml"));

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"slides: [oops".to_vec()).file_name("deck.yml"));
    let response = server.post("/api/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid YAML"));

    let form = MultipartForm::new().add_text("other", "value");
    let response = server.post("/api/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No file provided");
}

#[tokio::test]
async fn test_chat_connection_refused() {
    let (_dir, server) = create_test_server();
    let response = server.post("/api/chat").json(&json!({ "message": "hello" })).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("Cannot connect"));
    assert!(!json["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_empty_message() {
    let (_dir, server) = create_test_server();
    let response = server.post("/api/chat").json(&json!({ "message": "" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No message provided");
}

#[tokio::test]
async fn test_chat_returns_extracted_yaml() {
    let ollama = MockServer::start_async().await;
    ollama
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({
                "response": "Try this:\n```yaml\nslides:\n  - type: divider\n    title: Intro\n```"
            }));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::new(router(state_in(dir.path(), &ollama.base_url()))).unwrap();
    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "One divider please", "model": "mistral" }))
        .await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["model"], "mistral");
    assert_eq!(json["yaml_content"], "slides:\n  - type: divider\n    title: Intro");
}

#[tokio::test]
async fn test_chat_models_fall_back_when_offline() {
    let (_dir, server) = create_test_server();
    let json = server.get("/api/chat/models").await.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["models"], json!(["llama3.2", "llama3.1", "mistral"]));
}

#[tokio::test]
async fn test_chat_connection_test() {
    let (_dir, server) = create_test_server();
    let response = server.get("/api/chat/test").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
    assert!(!json["suggestions"].as_array().unwrap().is_empty());

    let ollama = MockServer::start_async().await;
    ollama
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({ "models": [] }));
        })
        .await;
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::new(router(state_in(dir.path(), &ollama.base_url()))).unwrap();
    let json = server.get("/api/chat/test").await.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["ollama_url"], ollama.base_url());
}
