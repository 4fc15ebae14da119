//! Generator configuration: font family, font sizes per text role, limits.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Roles a piece of slide text can play. Each role has a fixed font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Heading,
    Body,
    Caption,
    Footer,
}

/// Font sizes in points, per text role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub title: u32,
    pub heading: u32,
    pub body: u32,
    pub caption: u32,
    pub footer: u32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 24,
            heading: 20,
            body: 14,
            caption: 12,
            footer: 10,
        }
    }
}

impl FontSizes {
    /// Size in points for a role.
    pub fn for_role(&self, role: TextRole) -> u32 {
        match role {
            TextRole::Title => self.title,
            TextRole::Heading => self.heading,
            TextRole::Body => self.body,
            TextRole::Caption => self.caption,
            TextRole::Footer => self.footer,
        }
    }
}

/// Settings shared by the generator and the validator.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Font family applied to every run.
    pub font_name: String,

    /// Point sizes per text role.
    pub font_sizes: FontSizes,

    /// Upper bound on slides per presentation.
    pub max_slides: usize,

    /// Longer text fields are truncated.
    pub max_field_chars: usize,

    /// Size ceiling used by the validator, in megabytes.
    pub max_file_size_mb: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            font_name: "Outfit".to_string(),
            font_sizes: FontSizes::default(),
            max_slides: 100,
            max_field_chars: 2000,
            max_file_size_mb: 50,
        }
    }
}

impl GeneratorConfig {
    /// Parse a YAML config document, filling missing keys with defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        if config.font_name.trim().is_empty() {
            return Err(Error::ConfigError("font_name must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded generator config from {}", path.display());
        Self::from_yaml(&text)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// File size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}
