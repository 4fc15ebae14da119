//! Synthetic master template for tests.
//!
//! Mirrors the structure of the HyFlux master: one slide master with a
//! 16:9 slide size and `layout_count` layouts, plus a leftover sample slide
//! with speaker notes that generation has to remove.

use crate::package::{content_types, rel_types, ContentTypes, Package, Relationship};
use hyflux_core::Result;
use std::path::Path;

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_NOTES: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";

/// Index of the quote layout, whose first placeholder is a body.
const QUOTE_LAYOUT: usize = 34;

/// Serialized template package.
pub fn template_bytes(layout_count: usize) -> Result<Vec<u8>> {
    template_package(layout_count)?.to_bytes()
}

/// Write a template to `path`.
pub fn write_template(path: &Path, layout_count: usize) -> Result<()> {
    template_package(layout_count)?.save(path)
}

pub fn template_package(layout_count: usize) -> Result<Package> {
    let mut package = Package::default();

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), CT_PRESENTATION.to_string()),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_MASTER.to_string()),
        ("/ppt/slides/slide1.xml".to_string(), content_types::SLIDE.to_string()),
        ("/ppt/notesSlides/notesSlide1.xml".to_string(), CT_NOTES.to_string()),
        ("/docProps/core.xml".to_string(), content_types::CORE_PROPERTIES.to_string()),
    ];
    for n in 1..=layout_count {
        overrides.push((format!("/ppt/slideLayouts/slideLayout{}.xml", n), CT_LAYOUT.to_string()));
    }
    package.set_content_types(&ContentTypes {
        defaults: vec![
            (
                "rels".to_string(),
                "application/vnd.openxmlformats-package.relationships+xml".to_string(),
            ),
            ("xml".to_string(), "application/xml".to_string()),
            ("png".to_string(), "image/png".to_string()),
        ],
        overrides,
    })?;

    package.set_relationships(
        "",
        &[
            Relationship::new("rId1", rel_types::OFFICE_DOCUMENT, "ppt/presentation.xml"),
            Relationship::new("rId2", rel_types::CORE_PROPERTIES, "docProps/core.xml"),
        ],
    )?;
    package.set_part("docProps/core.xml", core_xml().into_bytes());

    package.set_part("ppt/presentation.xml", presentation_xml().into_bytes());
    package.set_relationships(
        "ppt/presentation.xml",
        &[
            Relationship::new("rId1", rel_types::SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            Relationship::new("rId2", rel_types::SLIDE, "slides/slide1.xml"),
        ],
    )?;

    package.set_part("ppt/slideMasters/slideMaster1.xml", master_xml(layout_count).into_bytes());
    let master_rels: Vec<Relationship> = (1..=layout_count)
        .map(|n| {
            Relationship::new(
                format!("rId{}", n),
                rel_types::SLIDE_LAYOUT,
                format!("../slideLayouts/slideLayout{}.xml", n),
            )
        })
        .collect();
    package.set_relationships("ppt/slideMasters/slideMaster1.xml", &master_rels)?;

    for index in 0..layout_count {
        let part = format!("ppt/slideLayouts/slideLayout{}.xml", index + 1);
        package.set_part(&part, layout_xml(index).into_bytes());
        package.set_relationships(
            &part,
            &[Relationship::new(
                "rId1",
                rel_types::SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )],
        )?;
    }

    package.set_part("ppt/slides/slide1.xml", leftover_slide_xml().into_bytes());
    package.set_relationships(
        "ppt/slides/slide1.xml",
        &[
            Relationship::new("rId1", rel_types::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            Relationship::new("rId2", rel_types::NOTES_SLIDE, "../notesSlides/notesSlide1.xml"),
        ],
    )?;
    package.set_part(
        "ppt/notesSlides/notesSlide1.xml",
        format!(
            r#"{}<p:notes {}><p:cSld><p:spTree/></p:cSld></p:notes>"#,
            DECL, NAMESPACES
        )
        .into_bytes(),
    );
    package.set_relationships(
        "ppt/notesSlides/notesSlide1.xml",
        &[Relationship::new("rId1", rel_types::SLIDE, "../slides/slide1.xml")],
    )?;

    Ok(package)
}

fn core_xml() -> String {
    format!(
        r#"{}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>HyFlux Template</dc:title><dc:creator>HyFlux</dc:creator></cp:coreProperties>"#,
        DECL
    )
}

fn presentation_xml() -> String {
    format!(
        r#"{}<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        DECL, NAMESPACES
    )
}

fn master_xml(layout_count: usize) -> String {
    let ids: String = (1..=layout_count)
        .map(|n| format!(r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#, 2147483648u64 + n as u64, n))
        .collect();
    format!(
        r#"{}<p:sldMaster {}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld><p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
        DECL,
        NAMESPACES,
        group_properties(),
        placeholder_shape(2, "Title Placeholder 1", Some("title"), 0),
        ids
    )
}

fn layout_xml(index: usize) -> String {
    let shapes = match index {
        0 => [
            placeholder_shape(2, "Title 1", Some("ctrTitle"), 0),
            placeholder_shape(3, "Subtitle 2", Some("subTitle"), 1),
            placeholder_shape(4, "Date Placeholder 3", Some("dt"), 10),
            placeholder_shape(5, "Footer Placeholder 4", Some("ftr"), 11),
            placeholder_shape(6, "Slide Number Placeholder 5", Some("sldNum"), 12),
        ]
        .concat(),
        QUOTE_LAYOUT => [
            placeholder_shape(2, "Quote 1", None, 1),
            placeholder_shape(3, "Footer Placeholder 2", Some("ftr"), 11),
        ]
        .concat(),
        _ => [
            placeholder_shape(2, "Title 1", Some("title"), 0),
            placeholder_shape(3, "Content Placeholder 2", None, 1),
            placeholder_shape(4, "Content Placeholder 3", None, 2),
            placeholder_shape(5, "Content Placeholder 4", None, 3),
            placeholder_shape(6, "Footer Placeholder 5", Some("ftr"), 11),
        ]
        .concat(),
    };
    format!(
        r#"{}<p:sldLayout {}><p:cSld name="Layout {}"><p:spTree>{}{}</p:spTree></p:cSld></p:sldLayout>"#,
        DECL,
        NAMESPACES,
        index + 1,
        group_properties(),
        shapes
    )
}

fn leftover_slide_xml() -> String {
    format!(
        r#"{}<p:sld {}><p:cSld><p:spTree>{}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"><a:latin typeface="Arial"/></a:rPr><a:t>Click to add text</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
        DECL,
        NAMESPACES,
        group_properties()
    )
}

fn group_properties() -> &'static str {
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#
}

fn placeholder_shape(id: u32, name: &str, kind: Option<&str>, idx: u32) -> String {
    let kind_attr = kind.map(|k| format!(r#" type="{}""#, k)).unwrap_or_default();
    let idx_attr = if idx > 0 { format!(r#" idx="{}""#, idx) } else { String::new() };
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph{}{}/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Click to add text</a:t></a:r></a:p></p:txBody></p:sp>"#,
        id, name, kind_attr, idx_attr
    )
}
