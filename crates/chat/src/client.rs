//! HTTP client for the Ollama generate and tags endpoints.

use crate::error::{ChatError, Result};
use crate::extract::extract_yaml;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const LOCAL_OLLAMA_URL: &str = "http://localhost:11434";
pub const DOCKER_OLLAMA_URL: &str = "http://host.docker.internal:11434";

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Offered when the backend cannot list its models.
pub const DEFAULT_MODELS: [&str; 3] = ["llama3.2", "llama3.1", "mistral"];

const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const TAGS_TIMEOUT: Duration = Duration::from_secs(10);

/// Prepended to every user message.
pub const CONTEXT_PROMPT: &str = "You are an AI assistant helping users create PowerPoint presentations using YAML specifications.
You can help with:
- Writing YAML content for slides
- Suggesting slide structures
- Fixing YAML syntax errors
- Providing content ideas for presentations

When you write slide content, put it in a single ```yaml fenced block.

User question: ";

/// One round trip through the chat proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    pub user_message: String,
    pub model_id: String,
    pub raw_response: String,
    pub extracted_yaml: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    #[serde(default)]
    name: String,
}

/// Base URL of the Ollama service.
///
/// An explicit (non-blank) URL wins. Otherwise the Docker host alias is
/// used inside a container and localhost everywhere else.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    match explicit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.trim_end_matches('/').to_string(),
        None if Path::new("/.dockerenv").exists() => DOCKER_OLLAMA_URL.to_string(),
        None => LOCAL_OLLAMA_URL.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    http: reqwest::Client,
    generate_timeout: Duration,
    tags_timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            generate_timeout: GENERATE_TIMEOUT,
            tags_timeout: TAGS_TIMEOUT,
        }
    }

    /// Client for `OLLAMA_URL`, or the environment default.
    pub fn from_env() -> Self {
        let explicit = std::env::var("OLLAMA_URL").ok();
        Self::new(resolve_base_url(explicit.as_deref()))
    }

    pub fn with_timeouts(mut self, generate: Duration, tags: Duration) -> Self {
        self.generate_timeout = generate;
        self.tags_timeout = tags;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `message` to `model` (default [`DEFAULT_MODEL`]).
    pub async fn chat(&self, message: &str, model: Option<&str>) -> Result<ChatExchange> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL);

        let request = GenerateRequest {
            model,
            prompt: format!("{}{}", CONTEXT_PROMPT, message),
            stream: false,
        };

        log::debug!("Sending chat message to {} ({})", self.base_url, model);
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.generate_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e, self.generate_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                model: Some(model.to_string()),
                body,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        let raw_response = body
            .response
            .unwrap_or_else(|| "No response generated".to_string());
        let extracted_yaml = extract_yaml(&raw_response);

        log::info!(
            "Chat reply from {} ({} chars, yaml: {})",
            model,
            raw_response.len(),
            extracted_yaml.is_some()
        );
        Ok(ChatExchange {
            user_message: message.to_string(),
            model_id: model.to_string(),
            raw_response,
            extracted_yaml,
        })
    }

    /// Installed model names, failing on any backend problem.
    pub async fn fetch_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.tags_timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e, self.tags_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                model: None,
                body,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(tags
            .models
            .into_iter()
            .map(|m| m.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// Installed model names, or [`DEFAULT_MODELS`] when the listing is
    /// empty or fails.
    pub async fn list_models(&self) -> Vec<String> {
        match self.fetch_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => default_models(),
            Err(e) => {
                log::warn!("Could not list Ollama models: {}", e);
                default_models()
            }
        }
    }

    /// Probe the backend. Returns the base URL when it answers.
    pub async fn test_connection(&self) -> Result<String> {
        self.fetch_models().await?;
        Ok(self.base_url.clone())
    }

    fn request_error(&self, e: reqwest::Error, timeout: Duration) -> ChatError {
        if e.is_timeout() {
            ChatError::Timeout {
                seconds: timeout.as_secs(),
            }
        } else if e.is_connect() {
            ChatError::Connection {
                url: self.base_url.clone(),
            }
        } else {
            ChatError::Request(e.to_string())
        }
    }
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}
