//! Error types for deck generation and validation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing specs, generating or validating decks.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input is not syntactically valid YAML.
    #[error("Invalid YAML syntax: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The YAML parsed but does not have the shape of a content spec.
    #[error("{0}")]
    InvalidSpec(String),

    /// The spec asks for more slides than the configured limit.
    #[error("Presentation has {count} slides, the maximum is {max}")]
    TooManySlides { count: usize, max: usize },

    /// The master template could not be located.
    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    /// The master template is present but unusable.
    #[error("Invalid template: {0}")]
    TemplateError(String),

    /// The presentation package is structurally broken.
    #[error("PPTX package error: {0}")]
    PackageError(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// Generator configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
