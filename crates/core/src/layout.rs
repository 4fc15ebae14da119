//! Mapping from slide kinds to the fixed layouts of the master template.

use crate::spec::SlideSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a layout in the template's first slide master.
pub type LayoutIndex = usize;

/// Layout used whenever nothing more specific applies.
pub const DEFAULT_LAYOUT: LayoutIndex = 12;

/// The slide kinds a content spec can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    TitleWhite,
    TitleReverse,
    Divider,
    TextOnly,
    TitleOnly,
    TextContent,
    TwoColumn,
    ThreeColumn,
    Quote,
    EndSlide,
}

/// Slide kind to template layout index. Never mutated.
pub const LAYOUT_TABLE: [(SlideKind, LayoutIndex); 10] = [
    (SlideKind::TitleWhite, 0),
    (SlideKind::TitleReverse, 1),
    (SlideKind::Divider, 6),
    (SlideKind::TextOnly, 8),
    (SlideKind::TitleOnly, DEFAULT_LAYOUT),
    (SlideKind::TextContent, 21),
    (SlideKind::TwoColumn, 23),
    (SlideKind::ThreeColumn, 24),
    (SlideKind::Quote, 34),
    (SlideKind::EndSlide, 35),
];

impl SlideKind {
    /// All kinds, in table order.
    pub const ALL: [SlideKind; 10] = [
        SlideKind::TitleWhite,
        SlideKind::TitleReverse,
        SlideKind::Divider,
        SlideKind::TextOnly,
        SlideKind::TitleOnly,
        SlideKind::TextContent,
        SlideKind::TwoColumn,
        SlideKind::ThreeColumn,
        SlideKind::Quote,
        SlideKind::EndSlide,
    ];

    /// The `type` tag used for this kind in content specs.
    pub fn tag(self) -> &'static str {
        match self {
            SlideKind::TitleWhite => "title_white",
            SlideKind::TitleReverse => "title_reverse",
            SlideKind::Divider => "divider",
            SlideKind::TextOnly => "text_only",
            SlideKind::TitleOnly => "title_only",
            SlideKind::TextContent => "text_content",
            SlideKind::TwoColumn => "two_column",
            SlideKind::ThreeColumn => "three_column",
            SlideKind::Quote => "quote",
            SlideKind::EndSlide => "end_slide",
        }
    }

    /// Resolve a `type` tag. Case-insensitive, with the legacy aliases
    /// `title`, `two_content` and `three_content`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        let kind = match tag.as_str() {
            "title" => SlideKind::TitleWhite,
            "two_content" => SlideKind::TwoColumn,
            "three_content" => SlideKind::ThreeColumn,
            other => return Self::ALL.into_iter().find(|k| k.tag() == other),
        };
        Some(kind)
    }

    /// Index of this kind's layout in the template.
    pub fn layout_index(self) -> LayoutIndex {
        LAYOUT_TABLE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, idx)| *idx)
            .unwrap_or(DEFAULT_LAYOUT)
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Structural signals used to pick a layout for an untyped slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutSignals {
    /// Number of column text regions declared (left, middle, right).
    pub regions: usize,
    /// The slide declares a `quote` field.
    pub has_quote: bool,
    /// The slide declares an `attribution` field.
    pub has_attribution: bool,
}

impl LayoutSignals {
    /// Ordered decision table; the first matching row wins.
    pub fn infer(&self) -> SlideKind {
        match (self.regions, self.has_quote && self.has_attribution) {
            (r, _) if r >= 3 => SlideKind::ThreeColumn,
            (2, _) => SlideKind::TwoColumn,
            (_, true) => SlideKind::Quote,
            _ => SlideKind::TitleOnly,
        }
    }
}

/// Decide the kind of a slide from its declared `type` and its signals.
///
/// A recognized tag always wins. Anything else goes through the signal
/// table, so a bad tag never fails generation.
pub fn resolve_kind(declared: Option<&str>, signals: &LayoutSignals) -> SlideKind {
    match declared.and_then(SlideKind::from_tag) {
        Some(kind) => kind,
        None => {
            let kind = signals.infer();
            if let Some(tag) = declared {
                log::warn!("Unknown slide type '{}', using {}", tag, kind);
            }
            kind
        }
    }
}

/// Layout index for a parsed slide.
pub fn select_layout(slide: &SlideSpec) -> LayoutIndex {
    slide.kind().layout_index()
}
