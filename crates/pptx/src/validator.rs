//! Post-generation checklist for decks.

use crate::reader::{Deck, DeckReader};
use hyflux_core::{GeneratorConfig, Result, ValidationReport};
use std::path::Path;

/// Text left behind by unfilled placeholders or drafts. Matched case-insensitively.
pub const PROMPT_MARKERS: &[&str] = &["Click to add", "Add text", "<insert", "placeholder", "TODO"];

const MAX_LISTED_SLIDES: usize = 5;
const TARGET_RATIO: f64 = 16.0 / 9.0;
const RATIO_TOLERANCE: f64 = 0.01;
const TARGET_WIDTH_INCHES: f64 = 13.33;
const TARGET_HEIGHT_INCHES: f64 = 7.5;
const SIZE_TOLERANCE_INCHES: f64 = 0.01;

/// Check names, in report order.
pub mod checks {
    pub const SLIDE_COUNT: &str = "slide_count";
    pub const PLACEHOLDERS: &str = "placeholders";
    pub const FONTS: &str = "fonts";
    pub const DIMENSIONS: &str = "dimensions";
    pub const FILE_SIZE: &str = "file_size";
    pub const IMAGES: &str = "images";
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: GeneratorConfig,
}

impl Validator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Validate the deck at `path`. A file that is not a readable package is
    /// an error; everything else is reported.
    pub fn validate(&self, path: &Path, expected_slides: Option<usize>) -> Result<ValidationReport> {
        let deck = DeckReader::open(path)?;
        let report = self.check(&deck, expected_slides);
        log::info!(
            "Validated {}: {}",
            path.display(),
            if report.passed() { "passed" } else { "failed" }
        );
        Ok(report)
    }

    /// Run every check against an already read deck.
    pub fn check(&self, deck: &Deck, expected_slides: Option<usize>) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.check_slide_count(deck, expected_slides, &mut report);
        self.check_placeholders(deck, &mut report);
        self.check_fonts(deck, &mut report);
        self.check_dimensions(deck, &mut report);
        self.check_file_size(deck, &mut report);
        self.check_images(deck, &mut report);
        report
    }

    fn check_slide_count(&self, deck: &Deck, expected: Option<usize>, report: &mut ValidationReport) {
        let count = deck.slides.len();
        let (passed, detail) = match expected {
            Some(expected) if count == expected => (true, format!("{} slides", count)),
            Some(expected) => (false, format!("{} slides, expected {}", count, expected)),
            None if count == 0 => (false, "Presentation has no slides".to_string()),
            None if count > self.config.max_slides => (
                false,
                format!("{} slides, the maximum is {}", count, self.config.max_slides),
            ),
            None => (true, format!("{} slides", count)),
        };
        report.push(checks::SLIDE_COUNT, passed, detail);
    }

    fn check_placeholders(&self, deck: &Deck, report: &mut ValidationReport) {
        let markers: Vec<String> = PROMPT_MARKERS.iter().map(|m| m.to_lowercase()).collect();
        let mut found = Vec::new();

        for slide in &deck.slides {
            for shape in &slide.shapes {
                let text = shape.text();
                let lower = text.to_lowercase();
                if markers.iter().any(|m| lower.contains(m.as_str())) {
                    let excerpt: String = text.chars().take(50).collect();
                    found.push(format!("Slide {}: '{}'", slide.number, excerpt));
                }
            }
        }

        if found.is_empty() {
            report.push(checks::PLACEHOLDERS, true, "No unfilled placeholders");
            return;
        }

        let mut detail = format!("{} unfilled: {}", found.len(), found[..found.len().min(MAX_LISTED_SLIDES)].join("; "));
        if found.len() > MAX_LISTED_SLIDES {
            detail.push_str(&format!(" ... and {} more", found.len() - MAX_LISTED_SLIDES));
        }
        report.push(checks::PLACEHOLDERS, false, detail);
    }

    fn check_fonts(&self, deck: &Deck, report: &mut ValidationReport) {
        let family = self.config.font_name.as_str();
        let mut foreign: Vec<&str> = deck
            .slides
            .iter()
            .flat_map(|s| s.fonts.iter())
            .map(String::as_str)
            .filter(|f| !f.starts_with(family))
            .collect();
        foreign.sort_unstable();
        foreign.dedup();

        if foreign.is_empty() {
            report.push(checks::FONTS, true, format!("All fonts are {} family", family));
        } else {
            report.push(
                checks::FONTS,
                false,
                format!("Non-{} fonts found: {}", family, foreign.join(", ")),
            );
        }
    }

    fn check_dimensions(&self, deck: &Deck, report: &mut ValidationReport) {
        let Some(size) = deck.slide_size else {
            report.push(checks::DIMENSIONS, false, "Presentation has no slide size");
            return;
        };

        let (width, height) = (size.width_inches(), size.height_inches());
        let ratio_ok = (size.ratio() - TARGET_RATIO).abs() <= RATIO_TOLERANCE;
        let size_ok = (width - TARGET_WIDTH_INCHES).abs() <= SIZE_TOLERANCE_INCHES
            && (height - TARGET_HEIGHT_INCHES).abs() <= SIZE_TOLERANCE_INCHES;

        let detail = format!(
            "{:.2}\" x {:.2}\" (ratio {:.2}:1), expected 13.33\" x 7.5\" (16:9)",
            width,
            height,
            size.ratio()
        );
        report.push(checks::DIMENSIONS, ratio_ok && size_ok, detail);
    }

    fn check_file_size(&self, deck: &Deck, report: &mut ValidationReport) {
        let ceiling = self.config.max_file_size_bytes();
        match deck.file_size {
            Some(bytes) => {
                let mb = bytes as f64 / (1024.0 * 1024.0);
                let passed = bytes <= ceiling;
                let detail = if passed {
                    format!("{:.1} MB", mb)
                } else {
                    format!("{:.1} MB exceeds {} MB", mb, self.config.max_file_size_mb)
                };
                report.push(checks::FILE_SIZE, passed, detail);
            }
            None => report.push(checks::FILE_SIZE, true, "In-memory deck"),
        }
    }

    fn check_images(&self, deck: &Deck, report: &mut ValidationReport) {
        let broken: Vec<String> = deck
            .slides
            .iter()
            .flat_map(|s| {
                s.images
                    .iter()
                    .filter(|i| !i.present)
                    .map(move |i| format!("Slide {}: {}", s.number, i.part))
            })
            .collect();
        let total: usize = deck.slides.iter().map(|s| s.images.len()).sum();

        if broken.is_empty() {
            report.push(checks::IMAGES, true, format!("{} images resolved", total));
        } else {
            report.push(
                checks::IMAGES,
                false,
                format!("Missing image parts: {}", broken.join("; ")),
            );
        }
    }
}
