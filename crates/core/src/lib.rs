//! Core domain types for HyFlux deck generation: the YAML content spec,
//! the layout table, content normalization, generator configuration and
//! validation reports.

pub mod config;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod report;
pub mod spec;

pub use config::{FontSizes, GeneratorConfig, TextRole};
pub use error::{Error, Result};
pub use layout::{select_layout, LayoutIndex, LayoutSignals, SlideKind};
pub use normalize::{ContentNormalizer, Paragraph};
pub use report::{CheckResult, ValidationReport};
pub use spec::{PresentationSpec, SlideSpec, SpecCheck};
