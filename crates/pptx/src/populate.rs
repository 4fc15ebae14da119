//! Slide population: one slide part per spec entry, bound to a template layout.
//!
//! The slide gets its own copy of every layout placeholder except date,
//! footer and slide number. Each copy is tied back to the layout through its
//! `type`/`idx`, so geometry and prompts keep coming from the template.
//! Placeholders the spec has no text for are written empty.

use crate::template::{LayoutInfo, Placeholder};
use crate::xml::{write_error, NS_DRAWING, NS_PRESENTATION, NS_RELATIONSHIPS};
use hyflux_core::normalize::truncate_chars;
use hyflux_core::{ContentNormalizer, GeneratorConfig, Paragraph, Result, SlideSpec, TextRole};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Attribution lines on quote slides start with this.
const ATTRIBUTION_PREFIX: &str = "\u{2014} ";

/// A paragraph together with the role that decides its font size.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StyledParagraph {
    lines: Vec<String>,
    role: TextRole,
}

impl StyledParagraph {
    fn empty(role: TextRole) -> Self {
        Self { lines: Vec::new(), role }
    }
}

/// Text assigned to each cloned placeholder.
struct Slots<'a> {
    placeholders: &'a [&'a Placeholder],
    content: Vec<Vec<StyledParagraph>>,
}

impl<'a> Slots<'a> {
    fn new(placeholders: &'a [&'a Placeholder]) -> Self {
        Self {
            placeholders,
            content: vec![Vec::new(); placeholders.len()],
        }
    }

    fn title(&self) -> Option<usize> {
        self.placeholders.iter().position(|p| p.is_title())
    }

    fn by_idx(&self, idx: u32) -> Option<usize> {
        self.placeholders
            .iter()
            .position(|p| !p.is_title() && p.idx == idx)
    }

    /// Non-title placeholders with `idx > 0`, in reading order.
    fn bodies(&self) -> Vec<usize> {
        self.placeholders
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_title() && p.idx > 0)
            .map(|(i, _)| i)
            .collect()
    }

    fn first(&self) -> Option<usize> {
        if self.placeholders.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    fn put(&mut self, slot: Option<usize>, paragraphs: Vec<StyledParagraph>, field: &str) {
        if paragraphs.is_empty() {
            return;
        }
        match slot {
            Some(i) => self.content[i].extend(paragraphs),
            None => log::warn!("Layout has no placeholder for '{}', dropping it", field),
        }
    }
}

/// Builds slide XML from a layout and a slide spec.
#[derive(Debug, Clone, Default)]
pub struct SlidePopulator {
    config: GeneratorConfig,
    normalizer: ContentNormalizer,
}

impl SlidePopulator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            normalizer: ContentNormalizer::new(),
        }
    }

    /// Serialize one slide part for `slide` on `layout`.
    pub fn populate(&self, layout: &LayoutInfo, slide: &SlideSpec) -> Result<Vec<u8>> {
        let placeholders: Vec<&Placeholder> = layout.cloneable_placeholders().collect();
        let mut slots = Slots::new(&placeholders);
        self.fill(&mut slots, slide);

        log::debug!(
            "Populated {} slide on '{}' ({} placeholders)",
            slide.kind(),
            layout.name,
            placeholders.len()
        );
        self.write_slide(&placeholders, &slots.content)
    }

    fn fill(&self, slots: &mut Slots<'_>, slide: &SlideSpec) {
        match slide {
            SlideSpec::TitleWhite(s) | SlideSpec::TitleReverse(s) => {
                slots.put(slots.title(), self.heading("title", s.title.as_deref(), TextRole::Title), "title");
                let subtitle = s
                    .subtitle
                    .as_deref()
                    .map(|t| self.normalizer.normalize_subtitle(&self.limit("subtitle", t)));
                slots.put(
                    slots.by_idx(1),
                    self.body(subtitle.as_deref(), TextRole::Heading),
                    "subtitle",
                );
            }
            SlideSpec::Divider(s) => {
                slots.put(slots.title(), self.heading("title", s.title.as_deref(), TextRole::Heading), "title");
            }
            SlideSpec::TitleOnly(s) => {
                slots.put(slots.title(), self.heading("title", s.title.as_deref(), TextRole::Title), "title");
            }
            SlideSpec::TextOnly(s) | SlideSpec::TextContent(s) => {
                slots.put(slots.title(), self.heading("title", s.title.as_deref(), TextRole::Title), "title");
                let content = s.content.as_deref().map(|t| {
                    let t = self.limit("content", t);
                    if matches!(slide, SlideSpec::TextOnly(_)) {
                        self.normalizer.normalize_text(&t)
                    } else {
                        t
                    }
                });
                let body = slots.bodies().first().copied();
                slots.put(body, self.body(content.as_deref(), TextRole::Body), "content");
            }
            SlideSpec::TwoColumn(s) | SlideSpec::ThreeColumn(s) => {
                slots.put(slots.title(), self.heading("title", s.title.as_deref(), TextRole::Title), "title");
                let columns: Vec<(&str, Option<&str>)> = if matches!(slide, SlideSpec::ThreeColumn(_)) {
                    vec![
                        ("left_content", s.left.as_deref()),
                        ("middle_content", s.middle.as_deref()),
                        ("right_content", s.right.as_deref()),
                    ]
                } else {
                    if s.middle.is_some() {
                        log::debug!("Ignoring middle column on a two column slide");
                    }
                    vec![
                        ("left_content", s.left.as_deref()),
                        ("right_content", s.right.as_deref()),
                    ]
                };

                let bodies = slots.bodies();
                for (n, (field, text)) in columns.into_iter().enumerate() {
                    let text = text.map(|t| self.normalizer.normalize_text(&self.limit(field, t)));
                    slots.put(bodies.get(n).copied(), self.body(text.as_deref(), TextRole::Body), field);
                }
            }
            SlideSpec::Quote(s) => {
                let mut paragraphs = self.body(
                    s.quote.as_deref().map(|t| self.limit("quote", t)).as_deref(),
                    TextRole::Body,
                );
                if let Some(attribution) = s.attribution.as_deref() {
                    if !paragraphs.is_empty() {
                        paragraphs.push(StyledParagraph::empty(TextRole::Body));
                    }
                    let line = format!("{}{}", ATTRIBUTION_PREFIX, attribution);
                    paragraphs.extend(self.heading("attribution", Some(&line), TextRole::Caption));
                }
                slots.put(slots.first(), paragraphs, "quote");
            }
            SlideSpec::EndSlide(s) => {
                slots.put(slots.title(), self.heading("title", Some(&s.title), TextRole::Title), "title");
                let contact = s.contact.as_deref().map(|t| self.limit("contact", t));
                let body = slots.bodies().first().copied();
                slots.put(body, self.body(contact.as_deref(), TextRole::Caption), "contact");
            }
        }
    }

    /// Enforce the per-field length limit.
    fn limit(&self, field: &str, text: &str) -> String {
        let max = self.config.max_field_chars;
        let limited = truncate_chars(text, max);
        if limited != text {
            log::warn!("Field '{}' exceeds {} characters, truncating", field, max);
        }
        limited
    }

    /// A single paragraph; embedded newlines become line breaks.
    fn heading(&self, field: &str, text: Option<&str>, role: TextRole) -> Vec<StyledParagraph> {
        let Some(text) = text else {
            return Vec::new();
        };
        let text = self.limit(field, text);
        let lines: Vec<String> = text.trim().lines().map(|l| l.trim().to_string()).collect();
        vec![StyledParagraph { lines, role }]
    }

    fn body(&self, text: Option<&str>, role: TextRole) -> Vec<StyledParagraph> {
        text.map(|t| self.normalizer.paragraphs(t))
            .unwrap_or_default()
            .into_iter()
            .map(|Paragraph { lines }| StyledParagraph { lines, role })
            .collect()
    }

    fn write_slide(&self, placeholders: &[&Placeholder], content: &[Vec<StyledParagraph>]) -> Result<Vec<u8>> {
        let mut w = XmlOut::new();
        w.decl()?;
        w.start(
            "p:sld",
            &[
                ("xmlns:a", NS_DRAWING),
                ("xmlns:r", NS_RELATIONSHIPS),
                ("xmlns:p", NS_PRESENTATION),
            ],
        )?;
        w.start("p:cSld", &[])?;
        w.start("p:spTree", &[])?;

        w.start("p:nvGrpSpPr", &[])?;
        w.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
        w.empty("p:cNvGrpSpPr", &[])?;
        w.empty("p:nvPr", &[])?;
        w.end("p:nvGrpSpPr")?;
        w.empty("p:grpSpPr", &[])?;

        for (n, (placeholder, paragraphs)) in placeholders.iter().zip(content).enumerate() {
            self.write_shape(&mut w, n as u32 + 2, placeholder, paragraphs)?;
        }

        w.end("p:spTree")?;
        w.end("p:cSld")?;
        w.start("p:clrMapOvr", &[])?;
        w.empty("a:masterClrMapping", &[])?;
        w.end("p:clrMapOvr")?;
        w.end("p:sld")?;
        Ok(w.into_inner())
    }

    fn write_shape(
        &self,
        w: &mut XmlOut,
        id: u32,
        placeholder: &Placeholder,
        paragraphs: &[StyledParagraph],
    ) -> Result<()> {
        let id = id.to_string();
        let idx = placeholder.idx.to_string();
        let mut ph: Vec<(&str, &str)> = Vec::new();
        if let Some(kind) = placeholder.kind.as_deref() {
            ph.push(("type", kind));
        }
        if placeholder.idx > 0 {
            ph.push(("idx", idx.as_str()));
        }

        w.start("p:sp", &[])?;
        w.start("p:nvSpPr", &[])?;
        w.empty("p:cNvPr", &[("id", id.as_str()), ("name", placeholder.name.as_str())])?;
        w.start("p:cNvSpPr", &[])?;
        w.empty("a:spLocks", &[("noGrp", "1")])?;
        w.end("p:cNvSpPr")?;
        w.start("p:nvPr", &[])?;
        w.empty("p:ph", &ph)?;
        w.end("p:nvPr")?;
        w.end("p:nvSpPr")?;
        w.empty("p:spPr", &[])?;

        w.start("p:txBody", &[])?;
        w.empty("a:bodyPr", &[])?;
        w.empty("a:lstStyle", &[])?;
        if paragraphs.is_empty() {
            w.empty("a:p", &[])?;
        }
        for paragraph in paragraphs {
            self.write_paragraph(w, paragraph)?;
        }
        w.end("p:txBody")?;
        w.end("p:sp")
    }

    fn write_paragraph(&self, w: &mut XmlOut, paragraph: &StyledParagraph) -> Result<()> {
        let size = (self.config.font_sizes.for_role(paragraph.role) * 100).to_string();
        let font = self.config.font_name.as_str();

        w.start("a:p", &[])?;
        for (n, line) in paragraph.lines.iter().enumerate() {
            if n > 0 {
                w.start("a:br", &[])?;
                w.run_properties("a:rPr", &size, font)?;
                w.end("a:br")?;
            }
            if line.is_empty() {
                continue;
            }
            w.start("a:r", &[])?;
            w.run_properties("a:rPr", &size, font)?;
            w.start("a:t", &[])?;
            w.text(line)?;
            w.end("a:t")?;
            w.end("a:r")?;
        }
        w.run_properties("a:endParaRPr", &size, font)?;
        w.end("a:p")
    }
}

/// Thin wrapper over the quick-xml writer with crate errors.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn decl(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(write_error)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let e = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(e)).map_err(write_error)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let e = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(e)).map_err(write_error)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_error)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)
    }

    /// `<a:rPr>`-style element carrying size and latin typeface.
    fn run_properties(&mut self, name: &str, size: &str, font: &str) -> Result<()> {
        self.start(name, &[("lang", "en-US"), ("sz", size), ("dirty", "0")])?;
        self.empty("a:latin", &[("typeface", font)])?;
        self.end(name)
    }

    fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
