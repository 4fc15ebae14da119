//! Shared application state

use hyflux_chat::OllamaClient;
use hyflux_core::GeneratorConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Request handlers read this and never mutate it.
#[derive(Clone)]
pub struct AppState {
    /// Explicit master template; searched for per request when unset.
    pub template: Option<PathBuf>,
    pub config: Arc<GeneratorConfig>,
    pub output_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub saved_dir: PathBuf,
    /// Sample spec served by `/api/template` when present.
    pub sample: Option<PathBuf>,
    pub chat: OllamaClient,
}

impl AppState {
    /// Create the output, upload and saved directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.output_dir, &self.upload_dir, &self.saved_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
