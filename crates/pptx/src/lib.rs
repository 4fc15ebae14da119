//! PPTX (Office Open XML) backend for HyFlux deck generation.
//!
//! A .pptx file is a ZIP archive of XML parts. Generation copies the master
//! template package in memory, drops its slides, and appends one slide per
//! spec entry bound to a template layout. Validation reads a package back
//! and runs a fixed checklist over it.

pub mod generator;
pub mod package;
pub mod populate;
pub mod reader;
pub mod template;
pub mod validator;
mod xml;

#[cfg(any(test, feature = "fixture"))]
pub mod fixture;

pub use generator::{GenerationSummary, PptxGenerator};
pub use package::Package;
pub use populate::SlidePopulator;
pub use reader::{Deck, DeckReader, SlideInfo};
pub use template::{find_template, LayoutInfo, Placeholder, SlideSize, Template};
pub use validator::Validator;
