//! Error types for the HyFlux server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hyflux_chat::ChatError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Chat(err) => chat_status(err),
        }
    }
}

fn chat_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
        ChatError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ChatError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ChatError::Status { .. } | ChatError::Decode(_) | ChatError::Request(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let suggestions = match &self {
            ApiError::Chat(err) => err.suggestions(),
            _ => Vec::new(),
        };
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::debug!("Rejected request: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            suggestions,
        };

        (status, Json(body)).into_response()
    }
}

impl From<hyflux_core::Error> for ApiError {
    fn from(err: hyflux_core::Error) -> Self {
        use hyflux_core::Error;
        match err {
            Error::YamlError(_) | Error::InvalidSpec(_) | Error::TooManySlides { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            Error::TemplateNotFound(_) => ApiError::Internal(format!(
                "{}. Please ensure {} is in templates/ directory.",
                err,
                hyflux_pptx::template::TEMPLATE_FILE
            )),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Background task failed: {}", err))
    }
}
