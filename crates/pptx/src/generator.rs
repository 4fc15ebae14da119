//! Deck generation: template package in, populated package out.

use crate::package::{
    content_types, next_relationship_id, rel_types, relative_target, ContentTypes, Package, Relationship,
    CORE_PROPERTIES_PART,
};
use crate::populate::SlidePopulator;
use crate::template::Template;
use crate::xml::{local_name, write_error, xml_error};
use chrono::{NaiveDate, Utc};
use hyflux_core::layout::DEFAULT_LAYOUT;
use hyflux_core::{select_layout, Error, GeneratorConfig, LayoutIndex, PresentationSpec, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The HyFlux master has this many layouts; indices below are fixed.
pub const MIN_LAYOUTS: usize = 36;

/// First id PowerPoint accepts in `p:sldIdLst`.
const FIRST_SLIDE_ID: usize = 256;

const NS_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Outcome of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub output: PathBuf,
    pub slide_count: usize,
    /// Layout index used for each slide, in order.
    pub layouts: Vec<LayoutIndex>,
}

/// Generates decks from content specs using a fixed master template.
#[derive(Debug, Clone)]
pub struct PptxGenerator {
    template_path: PathBuf,
    config: GeneratorConfig,
    populator: SlidePopulator,
}

impl PptxGenerator {
    pub fn new(template_path: impl Into<PathBuf>, config: GeneratorConfig) -> Self {
        Self {
            template_path: template_path.into(),
            populator: SlidePopulator::new(config.clone()),
            config,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a deck and write it to `output`.
    pub fn generate(&self, spec: &PresentationSpec, output: &Path) -> Result<GenerationSummary> {
        let (package, layouts) = self.build(spec)?;
        package.save(output)?;

        log::info!("Generated {} slides into {}", layouts.len(), output.display());
        Ok(GenerationSummary {
            output: output.to_path_buf(),
            slide_count: layouts.len(),
            layouts,
        })
    }

    /// Build the output package in memory.
    pub fn build(&self, spec: &PresentationSpec) -> Result<(Package, Vec<LayoutIndex>)> {
        if spec.slides.len() > self.config.max_slides {
            return Err(Error::TooManySlides {
                count: spec.slides.len(),
                max: self.config.max_slides,
            });
        }

        let template = Template::open(&self.template_path)?;
        if template.layouts().len() < MIN_LAYOUTS {
            return Err(Error::TemplateError(format!(
                "expected at least {} layouts, found {}",
                MIN_LAYOUTS,
                template.layouts().len()
            )));
        }

        let layouts = template.layouts().to_vec();
        let presentation_part = template.presentation_part().to_string();
        let mut package = template.into_package();

        let mut pres_rels = clear_slides(&mut package, &presentation_part)?;
        let mut types = package.content_types()?;
        let mut slide_rel_ids = Vec::with_capacity(spec.slides.len());
        let mut used = Vec::with_capacity(spec.slides.len());

        for (n, slide) in spec.slides.iter().enumerate() {
            let mut index = select_layout(slide);
            if index >= layouts.len() {
                log::warn!(
                    "Layout {} for {} slide not in template, using {}",
                    index,
                    slide.kind(),
                    DEFAULT_LAYOUT
                );
                index = DEFAULT_LAYOUT;
            }
            let layout = &layouts[index];
            log::debug!("Slide {}: {} -> layout {} '{}'", n + 1, slide.kind(), index, layout.name);

            let part = format!("ppt/slides/slide{}.xml", n + 1);
            package.set_part(&part, self.populator.populate(layout, slide)?);
            package.set_relationships(
                &part,
                &[Relationship::new(
                    "rId1",
                    rel_types::SLIDE_LAYOUT,
                    relative_target(&part, &layout.part),
                )],
            )?;
            types.set_override(&part, content_types::SLIDE);

            let rel_id = next_relationship_id(&pres_rels);
            pres_rels.push(Relationship::new(
                rel_id.clone(),
                rel_types::SLIDE,
                relative_target(&presentation_part, &part),
            ));
            slide_rel_ids.push(rel_id);
            used.push(index);
        }

        package.set_relationships(&presentation_part, &pres_rels)?;
        let presentation = rewrite_slide_list(package.part_str(&presentation_part)?, &slide_rel_ids)?;
        package.set_part(&presentation_part, presentation);

        write_core_properties(&mut package, &mut types, spec)?;
        package.set_content_types(&types)?;

        Ok((package, used))
    }
}

/// Remove every slide and notes slide. Returns the presentation
/// relationships that remain.
fn clear_slides(package: &mut Package, presentation_part: &str) -> Result<Vec<Relationship>> {
    let is_slide_part =
        |name: &str| name.starts_with("ppt/slides/") || name.starts_with("ppt/notesSlides/");

    let removed = package.remove_parts(is_slide_part);
    let mut types = package.content_types()?;
    types.remove_overrides(is_slide_part);
    package.set_content_types(&types)?;

    let mut rels = package.relationships(presentation_part)?;
    rels.retain(|r| r.rel_type != rel_types::SLIDE);
    log::debug!("Removed {} template slide parts", removed);
    Ok(rels)
}

/// Replace `p:sldIdLst` with one entry per relationship id.
fn rewrite_slide_list(xml: &str, rel_ids: &[String]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::new());
    let mut skipping = false;
    let mut written = false;

    loop {
        let event = reader.read_event().map_err(xml_error("Error parsing presentation"))?;
        match &event {
            Event::Start(e) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                write_slide_list(&mut writer, rel_ids)?;
                written = true;
                skipping = true;
                continue;
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                skipping = false;
                continue;
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                write_slide_list(&mut writer, rel_ids)?;
                written = true;
                continue;
            }
            // No existing list: it belongs right before `p:sldSz`.
            Event::Start(e) | Event::Empty(e)
                if !written && local_name(e.name().as_ref()) == b"sldSz" =>
            {
                write_slide_list(&mut writer, rel_ids)?;
                written = true;
            }
            Event::End(e) if !written && local_name(e.name().as_ref()) == b"presentation" => {
                write_slide_list(&mut writer, rel_ids)?;
                written = true;
            }
            Event::Eof => break,
            _ => {}
        }
        if !skipping {
            writer.write_event(event).map_err(write_error)?;
        }
    }

    Ok(writer.into_inner())
}

fn write_slide_list(writer: &mut Writer<Vec<u8>>, rel_ids: &[String]) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("p:sldIdLst")))
        .map_err(write_error)?;
    for (n, rel_id) in rel_ids.iter().enumerate() {
        let id = (FIRST_SLIDE_ID + n).to_string();
        let e = BytesStart::new("p:sldId").with_attributes([("id", id.as_str()), ("r:id", rel_id.as_str())]);
        writer.write_event(Event::Empty(e)).map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("p:sldIdLst")))
        .map_err(write_error)?;
    Ok(())
}

/// Core property values taken from the spec.
struct CoreValues {
    title: Option<String>,
    creator: Option<String>,
    created: Option<String>,
    modified: String,
}

impl CoreValues {
    fn from_spec(spec: &PresentationSpec) -> Self {
        Self {
            title: spec.title.clone(),
            creator: spec.author.clone(),
            created: spec.date.map(w3c_date),
            modified: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }

    /// `(local name, qualified name, value, is a W3CDTF date)`
    fn entries(&self) -> Vec<(&'static [u8], &'static str, &str, bool)> {
        let mut entries = Vec::new();
        if let Some(title) = &self.title {
            entries.push((b"title".as_slice(), "dc:title", title.as_str(), false));
        }
        if let Some(creator) = &self.creator {
            entries.push((b"creator".as_slice(), "dc:creator", creator.as_str(), false));
        }
        if let Some(created) = &self.created {
            entries.push((b"created".as_slice(), "dcterms:created", created.as_str(), true));
        }
        entries.push((b"modified".as_slice(), "dcterms:modified", self.modified.as_str(), true));
        entries
    }
}

fn w3c_date(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

/// Write title, author and date into `docProps/core.xml`, keeping other properties.
fn write_core_properties(
    package: &mut Package,
    types: &mut ContentTypes,
    spec: &PresentationSpec,
) -> Result<()> {
    let values = CoreValues::from_spec(spec);
    let entries = values.entries();

    let xml = if package.contains(CORE_PROPERTIES_PART) {
        update_core_xml(package.part_str(CORE_PROPERTIES_PART)?, &entries)?
    } else {
        let mut root = package.relationships("")?;
        root.push(Relationship::new(
            next_relationship_id(&root),
            rel_types::CORE_PROPERTIES,
            CORE_PROPERTIES_PART,
        ));
        package.set_relationships("", &root)?;
        types.set_override(CORE_PROPERTIES_PART, content_types::CORE_PROPERTIES);
        new_core_xml(&entries)?
    };

    package.set_part(CORE_PROPERTIES_PART, xml);
    Ok(())
}

type CoreEntry<'a> = (&'static [u8], &'static str, &'a str, bool);

fn update_core_xml(xml: &str, entries: &[CoreEntry<'_>]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    let mut skip_depth: Option<usize> = None;

    loop {
        let event = reader.read_event().map_err(xml_error("Error parsing core properties"))?;
        match &event {
            Event::Start(e) => {
                depth += 1;
                let replaced = depth == 2 && entries.iter().any(|(name, ..)| *name == local_name(e.name().as_ref()));
                if replaced && skip_depth.is_none() {
                    skip_depth = Some(depth);
                }
            }
            Event::Empty(e) => {
                if depth == 1 && entries.iter().any(|(name, ..)| *name == local_name(e.name().as_ref())) {
                    continue;
                }
            }
            Event::End(e) => {
                if skip_depth == Some(depth) {
                    skip_depth = None;
                    depth -= 1;
                    continue;
                }
                if depth == 1 && local_name(e.name().as_ref()) == b"coreProperties" {
                    write_core_entries(&mut writer, entries)?;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        if skip_depth.is_none() {
            writer.write_event(event).map_err(write_error)?;
        }
    }

    Ok(writer.into_inner())
}

fn new_core_xml(entries: &[CoreEntry<'_>]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("cp:coreProperties").with_attributes([
            ("xmlns:cp", NS_CORE_PROPERTIES),
            ("xmlns:dc", NS_DC),
            ("xmlns:dcterms", NS_DCTERMS),
            ("xmlns:xsi", NS_XSI),
        ])))
        .map_err(write_error)?;
    write_core_entries(&mut writer, entries)?;
    writer
        .write_event(Event::End(BytesEnd::new("cp:coreProperties")))
        .map_err(write_error)?;
    Ok(writer.into_inner())
}

fn write_core_entries(writer: &mut Writer<Vec<u8>>, entries: &[CoreEntry<'_>]) -> Result<()> {
    for (_, qname, value, is_date) in entries {
        let mut start = BytesStart::new(*qname);
        if *is_date {
            start.push_attribute(("xsi:type", "dcterms:W3CDTF"));
        }
        writer.write_event(Event::Start(start)).map_err(write_error)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(write_error)?;
        writer
            .write_event(Event::End(BytesEnd::new(*qname)))
            .map_err(write_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;
    use crate::reader::DeckReader;
    use crate::template::parse_presentation;

    fn generator_with_layouts(dir: &tempfile::TempDir, layouts: usize) -> PptxGenerator {
        let template = dir.path().join("template.pptx");
        fixture::write_template(&template, layouts).unwrap();
        PptxGenerator::new(template, GeneratorConfig::default())
    }

    #[test]
    fn test_rewrite_slide_list() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldMasterIdLst><p:sldMasterId id="1" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId9"/></p:sldIdLst><p:sldSz cx="1" cy="1"/></p:presentation>"#;
        let out = rewrite_slide_list(xml, &["rId2".to_string(), "rId3".to_string()]).unwrap();
        let info = parse_presentation(std::str::from_utf8(&out).unwrap()).unwrap();
        assert_eq!(info.slide_ids, vec!["rId2", "rId3"]);
        assert_eq!(info.master_ids, vec!["rId1"]);
        assert!(info.slide_size.is_some());
    }

    #[test]
    fn test_rewrite_inserts_missing_slide_list() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldMasterIdLst><p:sldMasterId id="1" r:id="rId1"/></p:sldMasterIdLst><p:notesMasterIdLst><p:notesMasterId r:id="rId5"/></p:notesMasterIdLst><p:sldSz cx="1" cy="1"/></p:presentation>"#;
        let out = rewrite_slide_list(xml, &["rId2".to_string()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("<p:sldIdLst>").count(), 1);
        assert!(text.contains(
            r#"</p:notesMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz"#
        ));
    }

    #[test]
    fn test_rewrite_keeps_a_single_slide_list() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldMasterIdLst><p:sldMasterId id="1" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId9"/></p:sldIdLst><p:sldSz cx="1" cy="1"/></p:presentation>"#;
        let out = rewrite_slide_list(xml, &["rId2".to_string()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("<p:sldIdLst>").count(), 1);
        assert!(!text.contains("rId9"));
        assert!(text.contains(
            r#"</p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz"#
        ));
    }

    #[test]
    fn test_update_core_xml_replaces_values() {
        let xml = r#"<cp:coreProperties xmlns:cp="cp" xmlns:dc="dc"><dc:title>Old</dc:title><dc:subject>Keep</dc:subject></cp:coreProperties>"#;
        let entries: Vec<CoreEntry<'_>> = vec![(b"title".as_slice(), "dc:title", "New & shiny", false)];
        let out = String::from_utf8(update_core_xml(xml, &entries).unwrap()).unwrap();
        assert!(!out.contains("Old"));
        assert!(out.contains("<dc:subject>Keep</dc:subject>"));
        assert!(out.contains("<dc:title>New &amp; shiny</dc:title></cp:coreProperties>"));
    }

    #[test]
    fn test_generate_replaces_template_slides() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator_with_layouts(&dir, 36);
        let spec = PresentationSpec::from_yaml(
            "presentation:\n  title: Launch & Learn\n  author: Ops\n  date: 2025-03-01\nslides:\n  - type: title_white\n    title: Hello\n  - type: end_slide\n",
        )
        .unwrap();
        let output = dir.path().join("out/nested/deck.pptx");

        let summary = generator.generate(&spec, &output).unwrap();
        assert_eq!(summary.slide_count, 2);
        assert_eq!(summary.layouts, vec![0, 35]);
        assert!(output.exists());

        let package = Package::open(&output).unwrap();
        assert!(!package.contains("ppt/notesSlides/notesSlide1.xml"));
        let deck = DeckReader::read(&package).unwrap();
        let indices: Vec<_> = deck.slides.iter().map(|s| s.layout_index).collect();
        assert_eq!(indices, vec![Some(0), Some(35)]);
        assert_eq!(deck.slides[0].text(), "Hello");
        assert!(!deck.slides.iter().any(|s| s.text().contains("Click to add")));

        let core = package.part_str(CORE_PROPERTIES_PART).unwrap();
        assert!(core.contains("<dc:title>Launch &amp; Learn</dc:title>"));
        assert!(core.contains("<dc:creator>Ops</dc:creator>"));
        assert!(core.contains("2025-03-01T00:00:00Z"));

        let types = package.content_types().unwrap();
        let slides: Vec<_> = types
            .overrides
            .iter()
            .filter(|(p, _)| p.starts_with("/ppt/slides/"))
            .collect();
        assert_eq!(slides.len(), 2);
    }

    #[test]
    fn test_template_is_not_modified() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator_with_layouts(&dir, 36);
        let before = std::fs::read(generator.template_path()).unwrap();

        let spec = PresentationSpec::from_yaml("slides:\n  - type: divider\n    title: A\n").unwrap();
        generator.generate(&spec, &dir.path().join("a.pptx")).unwrap();

        assert_eq!(std::fs::read(generator.template_path()).unwrap(), before);
    }

    #[test]
    fn test_too_many_slides() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.pptx");
        fixture::write_template(&template, 36).unwrap();
        let config = GeneratorConfig {
            max_slides: 1,
            ..GeneratorConfig::default()
        };
        let generator = PptxGenerator::new(template, config);
        let spec = PresentationSpec::from_yaml("slides:\n  - {type: divider}\n  - {type: divider}\n").unwrap();
        assert!(matches!(
            generator.build(&spec),
            Err(Error::TooManySlides { count: 2, max: 1 })
        ));
    }

    #[test]
    fn test_template_with_too_few_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator_with_layouts(&dir, 12);
        let spec = PresentationSpec::from_yaml("slides: []").unwrap();
        assert!(matches!(generator.build(&spec), Err(Error::TemplateError(_))));
    }

    #[test]
    fn test_missing_template() {
        let generator = PptxGenerator::new("/nonexistent/template.pptx", GeneratorConfig::default());
        let spec = PresentationSpec::from_yaml("slides: []").unwrap();
        assert!(matches!(generator.build(&spec), Err(Error::TemplateNotFound(_))));
    }
}
