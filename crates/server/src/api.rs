//! API handlers for the HyFlux server
//!
//! Provides REST endpoints for:
//! - Spec validation and deck generation
//! - Downloading and checking generated decks
//! - Uploading, saving and loading YAML specs
//! - The LLM chat helper

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hyflux_core::spec::{self, SAMPLE_SPEC};
use hyflux_core::{CheckResult, PresentationSpec};
use hyflux_pptx::{find_template, PptxGenerator, Validator};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::files::{self, SavedFile};
use crate::AppState;

/// Upload size ceiling.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "hyflux-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Body of responses that carry YAML text.
#[derive(Serialize)]
pub struct ContentResponse {
    pub success: bool,
    pub content: String,
}

/// Handler: GET /api/template
pub async fn handle_template(State(state): State<AppState>) -> ApiResult<ContentResponse> {
    let content = match state.sample.as_deref().filter(|p| p.is_file()) {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => SAMPLE_SPEC.to_string(),
    };
    Ok(Json(ContentResponse {
        success: true,
        content,
    }))
}

#[derive(Deserialize)]
pub struct YamlRequest {
    #[serde(default)]
    pub yaml: String,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub message: String,
    pub warnings: Vec<String>,
}

/// Handler: POST /api/validate
pub async fn handle_validate(
    State(state): State<AppState>,
    payload: Result<Json<YamlRequest>, JsonRejection>,
) -> ApiResult<ValidateResponse> {
    let Json(request) = payload?;
    let checked = spec::check(&request.yaml, state.config.max_slides)?;
    if !checked.is_valid() {
        return Err(ApiError::BadRequest(format!(
            "Validation errors:\n{}",
            checked.errors.join("\n")
        )));
    }

    Ok(Json(ValidateResponse {
        success: true,
        message: format!("Valid YAML with {} slides", checked.slide_count),
        warnings: checked.warnings,
    }))
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub filename: String,
    pub slide_count: usize,
    pub message: String,
}

/// Handler: POST /api/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<YamlRequest>, JsonRejection>,
) -> ApiResult<GenerateResponse> {
    let Json(request) = payload?;
    let presentation = PresentationSpec::from_yaml(&request.yaml)?;
    let template = find_template(state.template.as_deref())?;

    let filename = files::output_filename(presentation.title.as_deref(), chrono::Local::now());
    let output = state.output_dir.join(&filename);
    let generator = PptxGenerator::new(template, (*state.config).clone());

    let summary = tokio::task::spawn_blocking(move || generator.generate(&presentation, &output))
        .await?
        .map_err(|e| match ApiError::from(e) {
            ApiError::Internal(msg) => ApiError::Internal(format!("Generation failed: {}", msg)),
            other => other,
        })?;

    log::info!("Generated {} ({} slides)", filename, summary.slide_count);
    Ok(Json(GenerateResponse {
        success: true,
        filename,
        slide_count: summary.slide_count,
        message: format!("Generated {} slides", summary.slide_count),
    }))
}

/// Resolve a generated deck by user-supplied name.
fn output_path(state: &AppState, filename: &str) -> Result<std::path::PathBuf, ApiError> {
    let not_found = || ApiError::NotFound("File not found".to_string());
    let name = files::sanitize_filename(filename).ok_or_else(not_found)?;
    let path = state.output_dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(not_found())
    }
}

/// Handler: GET /api/download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = output_path(&state, &filename)?;
    let bytes = tokio::fs::read(&path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, PPTX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub filename: String,
    pub passed: bool,
    pub checks: Vec<CheckResult>,
}

/// Handler: GET /api/report/:filename
pub async fn handle_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<ReportResponse> {
    let path = output_path(&state, &filename)?;
    let validator = Validator::new((*state.config).clone());
    let report = tokio::task::spawn_blocking(move || validator.validate(&path, None)).await??;

    Ok(Json(ReportResponse {
        success: true,
        filename,
        passed: report.passed(),
        checks: report.checks,
    }))
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub content: String,
}

/// Handler: POST /api/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let bad = |msg: String| ApiError::BadRequest(msg);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        if original.is_empty() {
            return Err(bad("No file selected".to_string()));
        }
        if !files::is_yaml_name(&original) {
            return Err(bad("File must be a YAML file (.yaml or .yml)".to_string()));
        }

        let bytes = field.bytes().await.map_err(|e| bad(e.body_text()))?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(bad("File exceeds the 16 MB upload limit".to_string()));
        }
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|_| bad("File must be UTF-8 text".to_string()))?;
        serde_yaml::from_str::<serde_yaml::Value>(&content)
            .map_err(|e| bad(format!("Invalid YAML: {}", e)))?;

        let filename = files::sanitize_filename(&original)
            .ok_or_else(|| bad("Invalid file name".to_string()))?;
        tokio::fs::create_dir_all(&state.upload_dir).await?;
        tokio::fs::write(state.upload_dir.join(&filename), &content).await?;
        log::info!("Stored upload {}", filename);

        return Ok(Json(UploadResponse {
            success: true,
            filename,
            content,
        }));
    }

    Err(bad("No file provided".to_string()))
}

#[derive(Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub yaml: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub filename: String,
    pub message: String,
}

/// Handler: POST /api/save
pub async fn handle_save(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> ApiResult<SaveResponse> {
    let Json(request) = payload?;
    if request.yaml.trim().is_empty() {
        return Err(ApiError::BadRequest("No YAML content provided".to_string()));
    }
    let filename = files::saved_filename(&request.filename)
        .ok_or_else(|| ApiError::BadRequest("Invalid file name".to_string()))?;

    tokio::fs::create_dir_all(&state.saved_dir).await?;
    tokio::fs::write(state.saved_dir.join(&filename), &request.yaml).await?;
    log::info!("Saved {}", filename);

    Ok(Json(SaveResponse {
        success: true,
        message: format!("Saved as {}", filename),
        filename,
    }))
}

#[derive(Serialize)]
pub struct SavedFilesResponse {
    pub success: bool,
    pub files: Vec<SavedFile>,
}

/// Handler: GET /api/saved-files
pub async fn handle_saved_files(State(state): State<AppState>) -> ApiResult<SavedFilesResponse> {
    let dir = state.saved_dir.clone();
    let files = tokio::task::spawn_blocking(move || files::list_saved(&dir)).await??;
    Ok(Json(SavedFilesResponse {
        success: true,
        files,
    }))
}

/// Handler: GET /api/load-file/:filename
pub async fn handle_load_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<ContentResponse> {
    let not_found = || ApiError::NotFound("File not found".to_string());
    let name = files::sanitize_filename(&filename).ok_or_else(not_found)?;
    let path = [&state.saved_dir, &state.upload_dir]
        .iter()
        .map(|dir| dir.join(&name))
        .find(|p| p.is_file())
        .ok_or_else(not_found)?;

    Ok(Json(ContentResponse {
        success: true,
        content: tokio::fs::read_to_string(path).await?,
    }))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml_content: Option<String>,
}

/// Handler: POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(request) = payload?;
    let exchange = state
        .chat
        .chat(&request.message, request.model.as_deref())
        .await?;

    Ok(Json(ChatResponse {
        success: true,
        response: exchange.raw_response,
        model: exchange.model_id,
        yaml_content: exchange.extracted_yaml,
    }))
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub success: bool,
    pub models: Vec<String>,
}

/// Handler: GET /api/chat/models
pub async fn handle_chat_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        success: true,
        models: state.chat.list_models().await,
    })
}

#[derive(Serialize)]
pub struct ConnectionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Handler: GET /api/chat/test
pub async fn handle_chat_test(State(state): State<AppState>) -> Response {
    match state.chat.test_connection().await {
        Ok(url) => Json(ConnectionResponse {
            success: true,
            ollama_url: Some(url),
            message: None,
            suggestions: Vec::new(),
        })
        .into_response(),
        Err(e) => {
            log::warn!("Ollama connection test failed: {}", e);
            let body = ConnectionResponse {
                success: false,
                ollama_url: None,
                message: Some(e.to_string()),
                suggestions: e.suggestions(),
            };
            (ApiError::Chat(e).status(), Json(body)).into_response()
        }
    }
}
