//! Read-back of a generated deck: slide order, layouts, text, fonts and images.

use crate::package::{rel_types, resolve_target, Package};
use crate::template::{
    first_master, layout_parts, parse_presentation, presentation_part, Placeholder, SlideSize,
};
use crate::xml::{attr, attr_local, local_name, xml_error};
use hyflux_core::{Error, LayoutIndex, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// A deck as seen by the validator.
#[derive(Debug, Clone)]
pub struct Deck {
    pub slide_size: Option<SlideSize>,
    /// Layout parts of the first slide master, in order.
    pub layouts: Vec<String>,
    pub slides: Vec<SlideInfo>,
    /// Size of the file on disk, when read from a file.
    pub file_size: Option<u64>,
}

/// One slide, in presentation order.
#[derive(Debug, Clone)]
pub struct SlideInfo {
    /// 1-based.
    pub number: usize,
    pub part: String,
    pub layout_part: Option<String>,
    /// Position of `layout_part` among the master's layouts.
    pub layout_index: Option<LayoutIndex>,
    pub shapes: Vec<ShapeInfo>,
    /// Explicit latin typefaces used anywhere on the slide.
    pub fonts: Vec<String>,
    pub images: Vec<ImageRef>,
}

impl SlideInfo {
    /// All slide text, one shape per line group.
    pub fn text(&self) -> String {
        self.shapes
            .iter()
            .map(ShapeInfo::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An internal image relationship of a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub part: String,
    /// The target part exists in the package.
    pub present: bool,
}

/// A text run with its size in hundredths of a point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInfo {
    pub text: String,
    pub size: Option<u32>,
}

/// Information about a shape extracted from slide XML.
#[derive(Debug, Clone, Default)]
pub struct ShapeInfo {
    pub name: String,
    pub placeholder: Option<Placeholder>,
    /// Paragraph texts; line breaks are `\n`.
    pub paragraphs: Vec<String>,
    pub runs: Vec<RunInfo>,
}

impl ShapeInfo {
    pub fn text(&self) -> String {
        self.paragraphs.join("\n").trim().to_string()
    }

    /// Run sizes, in run order.
    pub fn sizes(&self) -> Vec<u32> {
        self.runs.iter().filter_map(|r| r.size).collect()
    }
}

/// Parsed content of a single slide part.
#[derive(Debug, Clone, Default)]
pub struct SlideContent {
    pub shapes: Vec<ShapeInfo>,
    pub fonts: Vec<String>,
}

/// Reader for generated (or any) PPTX decks.
pub struct DeckReader;

impl DeckReader {
    pub fn open(path: &Path) -> Result<Deck> {
        let file_size = std::fs::metadata(path)?.len();
        let package = Package::open(path)?;
        let mut deck = Self::read(&package)?;
        deck.file_size = Some(file_size);
        Ok(deck)
    }

    pub fn read(package: &Package) -> Result<Deck> {
        let presentation_part = presentation_part(package)?;
        let info = parse_presentation(package.part_str(&presentation_part)?)?;

        let layouts = match first_master(package, &presentation_part, &info) {
            Ok(master) => layout_parts(package, &master)?,
            Err(_) => Vec::new(),
        };

        let slide_parts = slide_order(package, &presentation_part, &info.slide_ids)?;
        let mut slides = Vec::with_capacity(slide_parts.len());
        for (idx, part) in slide_parts.into_iter().enumerate() {
            slides.push(read_slide(package, part, idx + 1, &layouts)?);
        }

        Ok(Deck {
            slide_size: info.slide_size,
            layouts,
            slides,
            file_size: None,
        })
    }
}

/// Slide parts in `p:sldIdLst` order. Without an id list, slide
/// relationships are ordered by the number in their target.
fn slide_order(package: &Package, presentation_part: &str, slide_ids: &[String]) -> Result<Vec<String>> {
    let rels = package.relationships(presentation_part)?;

    if !slide_ids.is_empty() {
        return slide_ids
            .iter()
            .map(|id| {
                rels.iter()
                    .find(|r| &r.id == id)
                    .map(|r| resolve_target(presentation_part, &r.target))
                    .ok_or_else(|| {
                        Error::PackageError(format!("slide relationship '{}' is missing", id))
                    })
            })
            .collect();
    }

    let mut slides: Vec<(String, Option<usize>)> = rels
        .iter()
        .filter(|r| r.rel_type == rel_types::SLIDE)
        .map(|r| (resolve_target(presentation_part, &r.target), extract_slide_number(&r.target)))
        .collect();
    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });
    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

fn read_slide(package: &Package, part: String, number: usize, layouts: &[String]) -> Result<SlideInfo> {
    let content = parse_slide_xml(package.part_str(&part)?)?;
    let rels = package.relationships(&part)?;

    let layout_part = rels
        .iter()
        .find(|r| r.rel_type == rel_types::SLIDE_LAYOUT)
        .map(|r| resolve_target(&part, &r.target));
    let layout_index = layout_part
        .as_ref()
        .and_then(|lp| layouts.iter().position(|l| l == lp));

    let images = rels
        .iter()
        .filter(|r| r.rel_type == rel_types::IMAGE && !r.external)
        .map(|r| {
            let target = resolve_target(&part, &r.target);
            ImageRef {
                present: package.contains(&target),
                part: target,
            }
        })
        .collect();

    Ok(SlideInfo {
        number,
        part,
        layout_part,
        layout_index,
        shapes: content.shapes,
        fonts: content.fonts,
        images,
    })
}

/// Extract shapes with their text, run sizes and fonts from slide XML.
pub fn parse_slide_xml(xml: &str) -> Result<SlideContent> {
    let mut content = SlideContent::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut paragraph: Option<String> = None;
    let mut run: Option<RunInfo> = None;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_error("Error parsing slide"))? {
            Event::Start(ref e) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" | b"graphicFrame" => current_shape = Some(ShapeInfo::default()),
                b"p" => paragraph = Some(String::new()),
                b"r" => run = Some(RunInfo::default()),
                b"t" => in_text = true,
                b"br" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\n');
                    }
                }
                _ => shape_property(e, &mut current_shape, &mut run, &mut content.fonts),
            },
            Event::Empty(ref e) => match local_name(e.name().as_ref()) {
                b"p" => {
                    if let Some(shape) = current_shape.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\n');
                    }
                }
                _ => shape_property(e, &mut current_shape, &mut run, &mut content.fonts),
            },
            Event::Text(ref e) => {
                if in_text {
                    let text = e.unescape().unwrap_or_default();
                    if let Some(p) = paragraph.as_mut() {
                        p.push_str(&text);
                    }
                    if let Some(r) = run.as_mut() {
                        r.text.push_str(&text);
                    }
                }
            }
            Event::End(ref e) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"r" => {
                    if let (Some(r), Some(shape)) = (run.take(), current_shape.as_mut()) {
                        shape.runs.push(r);
                    }
                }
                b"p" => {
                    if let (Some(p), Some(shape)) = (paragraph.take(), current_shape.as_mut()) {
                        shape.paragraphs.push(p);
                    }
                }
                b"sp" | b"pic" | b"graphicFrame" => {
                    if let Some(shape) = current_shape.take() {
                        content.shapes.push(shape);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(content)
}

/// Attributes of shape-level elements: names, placeholders, run properties, fonts.
fn shape_property(
    e: &BytesStart<'_>,
    shape: &mut Option<ShapeInfo>,
    run: &mut Option<RunInfo>,
    fonts: &mut Vec<String>,
) {
    match local_name(e.name().as_ref()) {
        b"cNvPr" => {
            if let Some(shape) = shape.as_mut() {
                shape.name = attr(e, b"name").unwrap_or_default();
            }
        }
        b"ph" => {
            if let Some(shape) = shape.as_mut() {
                shape.placeholder = Some(Placeholder {
                    kind: attr_local(e, b"type"),
                    idx: attr_local(e, b"idx").and_then(|v| v.parse().ok()).unwrap_or(0),
                    name: shape.name.clone(),
                });
            }
        }
        b"rPr" => {
            if let Some(run) = run.as_mut() {
                run.size = attr(e, b"sz").and_then(|v| v.parse().ok());
            }
        }
        b"latin" => {
            // `+mj-lt` and friends refer to theme fonts
            if let Some(face) = attr(e, b"typeface").filter(|f| !f.starts_with('+')) {
                fonts.push(face);
            }
        }
        _ => {}
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
