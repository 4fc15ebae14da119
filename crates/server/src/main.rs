//! HyFlux web service
//!
//! Serves the deck generator over HTTP:
//!
//! - YAML spec validation and deck generation
//! - Download and validation reports of generated decks
//! - Upload, save and load of YAML specs
//! - A chat helper proxying to a local Ollama service

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use hyflux_chat::{resolve_base_url, OllamaClient};
use hyflux_core::GeneratorConfig;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

mod api;
mod error;
mod files;
mod state;
#[cfg(test)]
mod tests;

pub use state::AppState;

use api::{
    handle_chat, handle_chat_models, handle_chat_test, handle_download, handle_generate,
    handle_health, handle_load_file, handle_report, handle_save, handle_saved_files,
    handle_template, handle_upload, handle_validate, MAX_UPLOAD_BYTES,
};

/// Multipart framing on top of the upload ceiling.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// Command-line arguments for the HyFlux server
#[derive(Parser, Debug)]
#[command(name = "hyflux-server")]
#[command(about = "HyFlux web service for YAML to PowerPoint generation")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Master template (default: searched under templates/)
    #[arg(long, env = "HYFLUX_TEMPLATE")]
    template: Option<PathBuf>,

    /// Directory for generated decks
    #[arg(long, env = "HYFLUX_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Directory for uploaded specs
    #[arg(long, env = "HYFLUX_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory for saved specs
    #[arg(long, env = "HYFLUX_SAVED_DIR", default_value = "saved")]
    saved_dir: PathBuf,

    /// Sample spec served by /api/template
    #[arg(long, env = "HYFLUX_SAMPLE")]
    sample: Option<PathBuf>,

    /// Generator config file (YAML)
    #[arg(long, env = "HYFLUX_CONFIG")]
    config: Option<PathBuf>,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Static UI directory served for unmatched paths
    #[arg(long, env = "HYFLUX_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// All API routes over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // Specs and generation
        .route("/api/template", get(handle_template))
        .route("/api/validate", post(handle_validate))
        .route("/api/generate", post(handle_generate))
        .route("/api/download/:filename", get(handle_download))
        .route("/api/report/:filename", get(handle_report))
        // Spec files
        .route("/api/upload", post(handle_upload))
        .route("/api/save", post(handle_save))
        .route("/api/saved-files", get(handle_saved_files))
        .route("/api/load-file/:filename", get(handle_load_file))
        // Chat helper
        .route("/api/chat", post(handle_chat))
        .route("/api/chat/models", get(handle_chat_models))
        .route("/api/chat/test", get(handle_chat_test))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = GeneratorConfig::load_or_default(args.config.as_deref())
        .context("Failed to load generator config")?;

    match hyflux_pptx::find_template(args.template.as_deref()) {
        Ok(path) => log::info!("Template: {}", path.display()),
        Err(e) => log::warn!("{}; generation will fail until it is available", e),
    }

    let chat = OllamaClient::new(resolve_base_url(args.ollama_url.as_deref()));
    log::info!("Ollama: {}", chat.base_url());

    let state = AppState {
        template: args.template,
        config: Arc::new(config),
        output_dir: args.output_dir,
        upload_dir: args.upload_dir,
        saved_dir: args.saved_dir,
        sample: args.sample,
        chat,
    };
    state.ensure_dirs().context("Failed to create data directories")?;

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = router(state);
    if let Some(dir) = args.static_dir {
        log::info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }
    let app = app.layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    log::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
