//! Content normalization for slide text.
//!
//! Canonicalizes bullet markup in free-form YAML text, then breaks the
//! result into paragraphs the way the template's bullet styles expect:
//! one paragraph per bullet, with the marker itself left to the template.

use regex::Regex;
use std::sync::LazyLock;

/// Regex for numbered list items such as `1. ` or `2) `.
static NUMBERED_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s").unwrap());

/// Characters accepted as bullet markers in spec text.
const BULLET_CHARS: &[char] = &['•', '-', '*'];

/// Canonical bullet marker.
const BULLET: char = '•';

/// Headings shorter than this are folded into bullets.
const MAX_HEADING_CHARS: usize = 50;

/// Plain lines right after a bullet shorter than this become bullets.
const MAX_CONTINUATION_CHARS: usize = 100;

/// Paragraph terminators; a plain line after one starts a new paragraph.
const PARAGRAPH_END_CHARS: &[char] = &[':', '.', '!'];

/// A text paragraph. Multiple lines are rendered with line breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub lines: Vec<String>,
}

impl Paragraph {
    fn single(line: impl Into<String>) -> Self {
        Self { lines: vec![line.into()] }
    }

    /// Full paragraph text with `\n` between lines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    fn ends_sentence(&self) -> bool {
        self.lines
            .last()
            .map(|l| l.ends_with(PARAGRAPH_END_CHARS))
            .unwrap_or(false)
    }
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(BULLET_CHARS) || NUMBERED_ITEM_REGEX.is_match(line)
}

/// Remove one leading bullet marker and the whitespace after it.
fn strip_bullet(line: &str) -> &str {
    line.strip_prefix(BULLET_CHARS).unwrap_or(line).trim()
}

/// Content normalizer for spec text fields.
#[derive(Debug, Clone, Default)]
pub struct ContentNormalizer;

impl ContentNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize bullet-style body text.
    ///
    /// - Every bullet line starts with `•` (numbered items are kept as-is)
    /// - Blank lines inside a bullet block are dropped
    /// - Short headings (`Label:`) become bullets
    /// - A short plain line right after a bullet becomes a bullet; a long
    ///   one ends the bullet block
    pub fn normalize_text(&self, content: &str) -> String {
        if content.is_empty() {
            return String::new();
        }

        let mut output: Vec<String> = Vec::new();
        let mut in_bullet_block = false;
        let mut last_was_bullet = false;

        for line in content.split('\n') {
            let stripped = line.trim();

            if stripped.is_empty() {
                if !in_bullet_block {
                    output.push(String::new());
                }
                continue;
            }

            if is_bullet(stripped) {
                in_bullet_block = true;
                last_was_bullet = true;
                if stripped.starts_with(&['-', '*'][..]) {
                    output.push(format!("{} {}", BULLET, strip_bullet(stripped)));
                } else {
                    output.push(stripped.to_string());
                }
                continue;
            }

            let is_heading =
                stripped.ends_with(':') && stripped.chars().count() < MAX_HEADING_CHARS;
            if is_heading {
                output.push(format!("{} {}", BULLET, stripped));
                in_bullet_block = true;
                last_was_bullet = true;
                continue;
            }

            if in_bullet_block && last_was_bullet {
                if stripped.chars().count() < MAX_CONTINUATION_CHARS {
                    output.push(format!("{} {}", BULLET, stripped));
                } else {
                    in_bullet_block = false;
                    output.push(String::new());
                    output.push(stripped.to_string());
                }
            } else {
                output.push(stripped.to_string());
            }
            last_was_bullet = false;
        }

        output.join("\n")
    }

    /// Collapse runs of blank lines in a subtitle, keeping at most one.
    pub fn normalize_subtitle(&self, subtitle: &str) -> String {
        let mut output: Vec<&str> = Vec::new();
        for line in subtitle.split('\n') {
            let keep = !line.trim().is_empty()
                || output.last().map(|l| !l.trim().is_empty()).unwrap_or(true);
            if keep {
                output.push(line);
            }
        }
        output.join("\n")
    }

    /// Break text into paragraphs.
    ///
    /// Blank lines become empty paragraphs and bullet lines start a new
    /// paragraph with the marker removed. Other lines continue the
    /// previous paragraph unless it is empty or ends a sentence.
    pub fn paragraphs(&self, content: &str) -> Vec<Paragraph> {
        let content = content.trim();
        if content.is_empty() {
            return Vec::new();
        }

        let mut paragraphs: Vec<Paragraph> = Vec::new();
        for line in content.split('\n') {
            let line = line.trim();

            if line.is_empty() {
                paragraphs.push(Paragraph::default());
            } else if line.starts_with(BULLET_CHARS) {
                paragraphs.push(Paragraph::single(strip_bullet(line)));
            } else {
                match paragraphs.last_mut() {
                    Some(current) if !current.is_empty() && !current.ends_sentence() => {
                        current.lines.push(line.to_string());
                    }
                    _ => paragraphs.push(Paragraph::single(line)),
                }
            }
        }

        paragraphs
    }
}

/// Truncate `text` to at most `max_chars` characters, marking the cut with `…`.
///
/// Returns the text unchanged when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
