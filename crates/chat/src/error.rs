//! Errors talking to the chat backend.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No message provided")]
    EmptyMessage,

    /// Nothing is listening at the backend URL.
    #[error("Cannot connect to Ollama at {url}")]
    Connection { url: String },

    #[error("Request to Ollama timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The backend answered with a non-success status.
    #[error("Ollama API error: HTTP {status}: {body}")]
    Status {
        status: u16,
        model: Option<String>,
        body: String,
    },

    /// The reply body was not the expected JSON.
    #[error("Invalid response from Ollama: {0}")]
    Decode(String),

    #[error("Ollama request failed: {0}")]
    Request(String),
}

impl ChatError {
    /// Remediation hints for the user, where the failure is diagnosable.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ChatError::Connection { url } => vec![
                "Start Ollama with `ollama serve`".to_string(),
                format!("Check that Ollama is reachable at {} (default port 11434)", url),
                "Set OLLAMA_URL if Ollama runs on another host".to_string(),
            ],
            ChatError::Timeout { .. } => vec![
                "The model may still be loading; try again in a moment".to_string(),
                "Try a smaller model".to_string(),
            ],
            ChatError::Status {
                status: 404,
                model,
                ..
            } => {
                let model = model.as_deref().unwrap_or("<model>");
                vec![format!("Pull the model first: `ollama pull {}`", model)]
            }
            ChatError::Status { .. } => vec!["Check the Ollama logs for details".to_string()],
            ChatError::EmptyMessage | ChatError::Decode(_) | ChatError::Request(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_suggests_pull() {
        let err = ChatError::Status {
            status: 404,
            model: Some("mistral".to_string()),
            body: "model not found".to_string(),
        };
        assert_eq!(err.suggestions(), vec!["Pull the model first: `ollama pull mistral`"]);
    }

    #[test]
    fn test_connection_suggestions_name_the_port() {
        let err = ChatError::Connection {
            url: "http://localhost:11434".to_string(),
        };
        assert!(err.suggestions().iter().any(|s| s.contains("11434")));
        assert!(ChatError::EmptyMessage.suggestions().is_empty());
    }
}
