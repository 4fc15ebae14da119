//! The YAML content specification: presentation metadata plus one entry
//! per output slide.
//!
//! Parsing is lenient. Unknown slide types fall back to an inferred layout
//! and missing fields are left for the template to fill with its defaults,
//! so an incomplete spec still produces a deck. [`check`] is the strict
//! counterpart used before generation to tell users what is off.

use crate::error::{Error, Result};
use crate::layout::{resolve_kind, LayoutSignals, SlideKind};
use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};

/// Title written on end slides that do not declare one.
pub const DEFAULT_END_TITLE: &str = "Thank You";

/// Sample spec served to users who have no sample file configured.
pub const SAMPLE_SPEC: &str = r#"# HyFlux Presentation Content Specification

presentation:
  title: "My Presentation"
  author: "Your Name"
  date: "2025-12-25"

slides:
  - type: title_white
    title: "My Presentation Title"
    subtitle: "Subtitle here"

  - type: divider
    title: "Section 1"

  - type: text_only
    title: "Content Slide"
    content: |
      Your content here
      • Point 1
      • Point 2

  - type: end_slide
    title: "Thank You"
    contact: "Contact information"
"#;

/// A parsed content spec. Immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationSpec {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<NaiveDate>,
    pub slides: Vec<SlideSpec>,
}

/// Title and subtitle, for both title slide variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleSlide {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

/// A slide carrying only a heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingSlide {
    pub title: Option<String>,
}

/// Heading plus one body region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSlide {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Heading plus two or three column regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSlide {
    pub title: Option<String>,
    pub left: Option<String>,
    pub middle: Option<String>,
    pub right: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteSlide {
    pub quote: Option<String>,
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndSlide {
    pub title: String,
    pub contact: Option<String>,
}

/// One output slide, one variant per layout kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideSpec {
    TitleWhite(TitleSlide),
    TitleReverse(TitleSlide),
    Divider(HeadingSlide),
    TextOnly(TextSlide),
    TitleOnly(HeadingSlide),
    TextContent(TextSlide),
    TwoColumn(ColumnSlide),
    ThreeColumn(ColumnSlide),
    Quote(QuoteSlide),
    EndSlide(EndSlide),
}

impl PresentationSpec {
    /// Parse a spec from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(&value)
    }

    /// Build a spec from an already parsed YAML document.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_mapping()
            .ok_or_else(|| Error::InvalidSpec("YAML must be a dictionary/object".to_string()))?;
        let slides = slide_entries(root)?;

        let meta = root.get("presentation").and_then(Value::as_mapping);
        let field = |key: &str| meta.and_then(|m| text_field(m, key));

        let date = field("date").and_then(|raw| match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                log::warn!("Ignoring unparsable presentation date '{}'", raw);
                None
            }
        });

        let mut parsed = Vec::with_capacity(slides.len());
        for (idx, entry) in slides.iter().enumerate() {
            let map = entry
                .as_mapping()
                .ok_or_else(|| Error::InvalidSpec(format!("Slide {}: must be an object", idx + 1)))?;
            parsed.push(SlideSpec::from_mapping(map));
        }

        Ok(Self {
            title: field("title"),
            author: field("author"),
            date,
            slides: parsed,
        })
    }
}

impl SlideSpec {
    /// Decode one slide entry. Never fails; see the module docs.
    pub fn from_mapping(map: &Mapping) -> Self {
        let declared = map.get("type").and_then(scalar_string);
        let columns = Columns::from_mapping(map);
        let signals = LayoutSignals {
            regions: columns.regions(),
            has_quote: map.contains_key("quote"),
            has_attribution: map.contains_key("attribution"),
        };
        let kind = resolve_kind(declared.as_deref(), &signals);
        let title = text_field(map, "title");

        match kind {
            SlideKind::TitleWhite | SlideKind::TitleReverse => {
                let slide = TitleSlide {
                    title,
                    subtitle: text_field(map, "content").or_else(|| text_field(map, "subtitle")),
                };
                if kind == SlideKind::TitleWhite {
                    SlideSpec::TitleWhite(slide)
                } else {
                    SlideSpec::TitleReverse(slide)
                }
            }
            SlideKind::Divider => SlideSpec::Divider(HeadingSlide { title }),
            SlideKind::TitleOnly => SlideSpec::TitleOnly(HeadingSlide { title }),
            SlideKind::TextOnly | SlideKind::TextContent => {
                let slide = TextSlide {
                    title,
                    content: text_field(map, "content"),
                };
                if kind == SlideKind::TextOnly {
                    SlideSpec::TextOnly(slide)
                } else {
                    SlideSpec::TextContent(slide)
                }
            }
            SlideKind::TwoColumn | SlideKind::ThreeColumn => {
                let slide = ColumnSlide {
                    title,
                    left: columns.left,
                    middle: columns.middle,
                    right: columns.right,
                };
                if kind == SlideKind::TwoColumn {
                    SlideSpec::TwoColumn(slide)
                } else {
                    SlideSpec::ThreeColumn(slide)
                }
            }
            SlideKind::Quote => SlideSpec::Quote(QuoteSlide {
                quote: text_field(map, "quote"),
                attribution: text_field(map, "attribution"),
            }),
            SlideKind::EndSlide => SlideSpec::EndSlide(EndSlide {
                title: title.unwrap_or_else(|| DEFAULT_END_TITLE.to_string()),
                contact: text_field(map, "contact"),
            }),
        }
    }

    pub fn kind(&self) -> SlideKind {
        match self {
            SlideSpec::TitleWhite(_) => SlideKind::TitleWhite,
            SlideSpec::TitleReverse(_) => SlideKind::TitleReverse,
            SlideSpec::Divider(_) => SlideKind::Divider,
            SlideSpec::TextOnly(_) => SlideKind::TextOnly,
            SlideSpec::TitleOnly(_) => SlideKind::TitleOnly,
            SlideSpec::TextContent(_) => SlideKind::TextContent,
            SlideSpec::TwoColumn(_) => SlideKind::TwoColumn,
            SlideSpec::ThreeColumn(_) => SlideKind::ThreeColumn,
            SlideSpec::Quote(_) => SlideKind::Quote,
            SlideSpec::EndSlide(_) => SlideKind::EndSlide,
        }
    }

    /// The slide heading, if the variant has one.
    pub fn title(&self) -> Option<&str> {
        match self {
            SlideSpec::TitleWhite(s) | SlideSpec::TitleReverse(s) => s.title.as_deref(),
            SlideSpec::Divider(s) | SlideSpec::TitleOnly(s) => s.title.as_deref(),
            SlideSpec::TextOnly(s) | SlideSpec::TextContent(s) => s.title.as_deref(),
            SlideSpec::TwoColumn(s) | SlideSpec::ThreeColumn(s) => s.title.as_deref(),
            SlideSpec::Quote(_) => None,
            SlideSpec::EndSlide(s) => Some(&s.title),
        }
    }

    /// Fields this variant needs but the spec left out.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            SlideSpec::Quote(s) => {
                if s.quote.is_none() {
                    missing.push("quote");
                }
            }
            SlideSpec::TextOnly(s) | SlideSpec::TextContent(s) => {
                if s.title.is_none() {
                    missing.push("title");
                }
                if s.content.is_none() {
                    missing.push("content");
                }
            }
            SlideSpec::TwoColumn(s) | SlideSpec::ThreeColumn(s) => {
                if s.title.is_none() {
                    missing.push("title");
                }
                if s.left.is_none() {
                    missing.push("left_content");
                }
                if self.kind() == SlideKind::ThreeColumn && s.middle.is_none() {
                    missing.push("middle_content");
                }
                if s.right.is_none() {
                    missing.push("right_content");
                }
            }
            SlideSpec::EndSlide(_) => {}
            _ => {
                if self.title().is_none() {
                    missing.push("title");
                }
            }
        }
        missing
    }
}

/// Column regions, from either `left_content`/`middle_content`/`right_content`
/// or a nested `content: {left, middle, right}` mapping.
#[derive(Debug, Default)]
struct Columns {
    left: Option<String>,
    middle: Option<String>,
    right: Option<String>,
}

impl Columns {
    fn from_mapping(map: &Mapping) -> Self {
        match map.get("content").and_then(Value::as_mapping) {
            Some(nested) => Self {
                left: text_field(nested, "left"),
                middle: text_field(nested, "middle"),
                right: text_field(nested, "right"),
            },
            None => Self {
                left: text_field(map, "left_content"),
                middle: text_field(map, "middle_content"),
                right: text_field(map, "right_content"),
            },
        }
    }

    fn regions(&self) -> usize {
        [&self.left, &self.middle, &self.right]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }
}

/// Result of a strict pre-generation check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecCheck {
    pub slide_count: usize,
    /// Problems that make the spec invalid.
    pub errors: Vec<String>,
    /// Problems generation tolerates.
    pub warnings: Vec<String>,
}

impl SpecCheck {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a spec strictly.
///
/// Syntax errors and a document without a `slides` list are returned as
/// errors. Per-slide problems are collected: an explicit but unknown `type`
/// or too many slides make the spec invalid, missing fields are warnings.
pub fn check(text: &str, max_slides: usize) -> Result<SpecCheck> {
    let value: Value = serde_yaml::from_str(text)?;
    let root = value
        .as_mapping()
        .ok_or_else(|| Error::InvalidSpec("YAML must be a dictionary/object".to_string()))?;
    let slides = slide_entries(root)?;

    let mut report = SpecCheck {
        slide_count: slides.len(),
        ..Default::default()
    };

    if slides.len() > max_slides {
        report.errors.push(format!(
            "Presentation has {} slides, the maximum is {}",
            slides.len(),
            max_slides
        ));
    }

    for (idx, entry) in slides.iter().enumerate() {
        let number = idx + 1;
        let Some(map) = entry.as_mapping() else {
            report.errors.push(format!("Slide {}: must be an object", number));
            continue;
        };

        if let Some(declared) = map.get("type").and_then(scalar_string) {
            if SlideKind::from_tag(&declared).is_none() {
                report
                    .errors
                    .push(format!("Slide {}: invalid type '{}'", number, declared));
                continue;
            }
        }

        let slide = SlideSpec::from_mapping(map);
        for field in slide.missing_fields() {
            report.warnings.push(format!(
                "Slide {} ({}): missing '{}'",
                number,
                slide.kind(),
                field
            ));
        }
    }

    Ok(report)
}

fn slide_entries(root: &Mapping) -> Result<&Vec<Value>> {
    match root.get("slides") {
        None => Err(Error::InvalidSpec("Missing \"slides\" section".to_string())),
        Some(Value::Sequence(slides)) => Ok(slides),
        Some(_) => Err(Error::InvalidSpec("\"slides\" must be a list".to_string())),
    }
}

/// A scalar rendered as a string. Sequences and mappings yield `None`.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// A text field, with lists and mappings rendered to lines. Blank text is
/// treated as absent.
fn text_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key)
        .map(render_text)
        .filter(|text| !text.trim().is_empty())
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(render_item)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Mapping(map) => render_mapping(map),
        other => scalar_string(other).unwrap_or_default(),
    }
}

/// One list item. Media mappings become marker lines.
fn render_item(item: &Value) -> String {
    let Some(map) = item.as_mapping() else {
        return render_text(item);
    };

    if let Some(image) = map.get("image") {
        let mut lines = vec![format!("[Image: {}]", render_text(image))];
        if let Some(caption) = text_field(map, "caption") {
            lines.push(caption);
        }
        return lines.join("\n");
    }
    if let Some(chart) = map.get("chart") {
        return format!("[Chart: {}]", render_text(chart));
    }
    render_mapping(map)
}

fn render_mapping(map: &Mapping) -> String {
    map.iter()
        .map(|(k, v)| {
            format!(
                "{}: {}",
                scalar_string(k).unwrap_or_default(),
                render_text(v)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
