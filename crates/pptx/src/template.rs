//! Master template loading: slide size, ordered layouts and their placeholders.

use crate::package::{rel_types, resolve_target, Package, PRESENTATION_PART};
use crate::xml::{attr, attr_local, local_name, xml_error};
use hyflux_core::{Error, LayoutIndex, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name of the HyFlux master template.
pub const TEMPLATE_FILE: &str = "HyFlux_Template_-.pptx";

/// EMUs per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Placeholder types that belong to the master and are never cloned onto slides.
const MASTER_ONLY_PLACEHOLDERS: &[&str] = &["dt", "ftr", "sldNum"];

/// Slide size from `p:sldSz`, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideSize {
    pub cx: i64,
    pub cy: i64,
}

impl SlideSize {
    pub fn width_inches(&self) -> f64 {
        self.cx as f64 / EMU_PER_INCH
    }

    pub fn height_inches(&self) -> f64 {
        self.cy as f64 / EMU_PER_INCH
    }

    /// Width divided by height; 0 for a degenerate size.
    pub fn ratio(&self) -> f64 {
        if self.cy == 0 {
            0.0
        } else {
            self.cx as f64 / self.cy as f64
        }
    }
}

/// A layout placeholder, identified by `type` and `idx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// `type` attribute; absent means a body/object placeholder.
    pub kind: Option<String>,
    pub idx: u32,
    pub name: String,
}

impl Placeholder {
    pub fn is_title(&self) -> bool {
        matches!(self.kind.as_deref(), Some("title") | Some("ctrTitle"))
    }

    /// Whether slides get their own copy of this placeholder.
    pub fn is_cloneable(&self) -> bool {
        !self
            .kind
            .as_deref()
            .map(|k| MASTER_ONLY_PLACEHOLDERS.contains(&k))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    /// Package path, e.g. `ppt/slideLayouts/slideLayout1.xml`.
    pub part: String,
    pub name: String,
    /// In document order.
    pub placeholders: Vec<Placeholder>,
}

impl LayoutInfo {
    pub fn cloneable_placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.placeholders.iter().filter(|p| p.is_cloneable())
    }
}

/// A loaded master template.
#[derive(Debug, Clone)]
pub struct Template {
    package: Package,
    presentation_part: String,
    master_part: String,
    slide_size: SlideSize,
    layouts: Vec<LayoutInfo>,
}

impl Template {
    /// Load a template from disk. The file itself is never written to.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::TemplateNotFound(path.display().to_string()));
        }
        let package = Package::open(path)?;
        let template = Self::from_package(package)?;
        log::debug!(
            "Loaded template {} with {} layouts",
            path.display(),
            template.layouts.len()
        );
        Ok(template)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let presentation_part = presentation_part(&package)?;
        let presentation = parse_presentation(package.part_str(&presentation_part)?)?;

        let slide_size = presentation
            .slide_size
            .ok_or_else(|| Error::TemplateError("presentation has no slide size".to_string()))?;

        let master_part = first_master(&package, &presentation_part, &presentation)?;
        let layouts = layout_parts(&package, &master_part)?
            .into_iter()
            .map(|part| read_layout(&package, part))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            package,
            presentation_part,
            master_part,
            slide_size,
            layouts,
        })
    }

    pub fn layouts(&self) -> &[LayoutInfo] {
        &self.layouts
    }

    pub fn layout(&self, index: LayoutIndex) -> Option<&LayoutInfo> {
        self.layouts.get(index)
    }

    pub fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    pub fn presentation_part(&self) -> &str {
        &self.presentation_part
    }

    pub fn master_part(&self) -> &str {
        &self.master_part
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn into_package(self) -> Package {
        self.package
    }
}

/// Places the master template is looked for, relative to the working directory.
pub fn template_candidates() -> Vec<PathBuf> {
    ["templates", "../templates", "hyflux-ppt-automation/templates"]
        .iter()
        .map(|dir| Path::new(dir).join(TEMPLATE_FILE))
        .collect()
}

/// The explicit template path if given, else the first existing candidate.
pub fn find_template(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::TemplateNotFound(path.display().to_string()));
    }

    let candidates = template_candidates();
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        log::debug!("Using template {}", found.display());
        return Ok(found.clone());
    }
    let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    Err(Error::TemplateNotFound(tried.join(", ")))
}

/// What the generator and reader need from `presentation.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationInfo {
    /// `r:id`s of `p:sldMasterId` entries, in order.
    pub master_ids: Vec<String>,
    /// `r:id`s of `p:sldId` entries, in order.
    pub slide_ids: Vec<String>,
    pub slide_size: Option<SlideSize>,
}

/// Main presentation part, via the package root relationships.
pub fn presentation_part(package: &Package) -> Result<String> {
    let root = package.relationships("")?;
    let part = root
        .iter()
        .find(|r| r.rel_type == rel_types::OFFICE_DOCUMENT)
        .map(|r| resolve_target("", &r.target))
        .unwrap_or_else(|| PRESENTATION_PART.to_string());

    if !package.contains(&part) {
        return Err(Error::PackageError(format!(
            "presentation part '{}' is missing",
            part
        )));
    }
    Ok(part)
}

pub fn parse_presentation(xml: &str) -> Result<PresentationInfo> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut info = PresentationInfo::default();

    loop {
        match reader.read_event().map_err(xml_error("Error parsing presentation"))? {
            Event::Empty(ref e) | Event::Start(ref e) => match local_name(e.name().as_ref()) {
                b"sldMasterId" => {
                    if let Some(id) = relationship_attr(e) {
                        info.master_ids.push(id);
                    }
                }
                b"sldId" => {
                    if let Some(id) = relationship_attr(e) {
                        info.slide_ids.push(id);
                    }
                }
                b"sldSz" => {
                    let cx = attr(e, b"cx").and_then(|v| v.parse().ok());
                    let cy = attr(e, b"cy").and_then(|v| v.parse().ok());
                    if let (Some(cx), Some(cy)) = (cx, cy) {
                        info.slide_size = Some(SlideSize { cx, cy });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(info)
}

/// `r:id`, whatever the relationships prefix is bound to.
fn relationship_attr(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| {
            let key = a.key.as_ref();
            key != b"id" && local_name(key) == b"id"
        })
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

pub(crate) fn first_master(package: &Package, presentation_part: &str, info: &PresentationInfo) -> Result<String> {
    let rels = package.relationships(presentation_part)?;
    let by_id = info
        .master_ids
        .first()
        .and_then(|id| rels.iter().find(|r| &r.id == id));
    let by_type = || rels.iter().find(|r| r.rel_type == rel_types::SLIDE_MASTER);

    let rel = by_id
        .or_else(by_type)
        .ok_or_else(|| Error::TemplateError("template has no slide master".to_string()))?;
    Ok(resolve_target(presentation_part, &rel.target))
}

/// Layout parts of a master, in `p:sldLayoutIdLst` order.
///
/// Falls back to the order of the master's layout relationships when the
/// master has no id list.
pub fn layout_parts(package: &Package, master_part: &str) -> Result<Vec<String>> {
    let rels = package.relationships(master_part)?;
    let xml = package.part_str(master_part)?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error("Error parsing slide master"))? {
            Event::Empty(ref e) | Event::Start(ref e) if local_name(e.name().as_ref()) == b"sldLayoutId" => {
                if let Some(id) = relationship_attr(e) {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let targets: Vec<&str> = if ids.is_empty() {
        rels.iter()
            .filter(|r| r.rel_type == rel_types::SLIDE_LAYOUT)
            .map(|r| r.target.as_str())
            .collect()
    } else {
        ids.iter()
            .filter_map(|id| rels.iter().find(|r| &r.id == id))
            .map(|r| r.target.as_str())
            .collect()
    };

    Ok(targets
        .into_iter()
        .map(|t| resolve_target(master_part, t))
        .collect())
}

fn read_layout(package: &Package, part: String) -> Result<LayoutInfo> {
    let xml = package.part_str(&part)?;
    let (name, placeholders) = parse_placeholders(xml)?;
    Ok(LayoutInfo {
        part,
        name,
        placeholders,
    })
}

/// Name of the `p:cSld` plus every placeholder shape, in document order.
pub fn parse_placeholders(xml: &str) -> Result<(String, Vec<Placeholder>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut name = String::new();
    let mut placeholders = Vec::new();
    let mut shape: Option<(String, Option<Placeholder>)> = None;

    loop {
        match reader.read_event().map_err(xml_error("Error parsing layout"))? {
            Event::Start(ref e) | Event::Empty(ref e) => match local_name(e.name().as_ref()) {
                b"cSld" => name = attr(e, b"name").unwrap_or_default(),
                b"sp" => shape = Some((String::new(), None)),
                b"cNvPr" => {
                    if let Some((shape_name, _)) = shape.as_mut() {
                        *shape_name = attr(e, b"name").unwrap_or_default();
                    }
                }
                b"ph" => {
                    if let Some((_, ph)) = shape.as_mut() {
                        *ph = Some(Placeholder {
                            kind: attr_local(e, b"type"),
                            idx: attr_local(e, b"idx").and_then(|v| v.parse().ok()).unwrap_or(0),
                            name: String::new(),
                        });
                    }
                }
                _ => {}
            },
            Event::End(ref e) if local_name(e.name().as_ref()) == b"sp" => {
                if let Some((shape_name, Some(mut ph))) = shape.take() {
                    ph.name = shape_name;
                    placeholders.push(ph);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((name, placeholders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;

    #[test]
    fn test_parse_presentation() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r">
            <p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
            <p:sldIdLst><p:sldId id="256" r:id="rId7"/><p:sldId id="257" r:id="rId8"/></p:sldIdLst>
            <p:sldSz cx="12192000" cy="6858000"/>
        </p:presentation>"#;
        let info = parse_presentation(xml).unwrap();
        assert_eq!(info.master_ids, vec!["rId1"]);
        assert_eq!(info.slide_ids, vec!["rId7", "rId8"]);
        assert_eq!(info.slide_size, Some(SlideSize { cx: 12192000, cy: 6858000 }));
    }

    #[test]
    fn test_parse_placeholders() {
        let xml = r#"<p:sldLayout xmlns:p="p" xmlns:a="a"><p:cSld name="Title Slide"><p:spTree>
            <p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr></p:sp>
            <p:sp><p:nvSpPr><p:cNvPr id="3" name="Subtitle 2"/><p:cNvSpPr/><p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr></p:nvSpPr></p:sp>
            <p:sp><p:nvSpPr><p:cNvPr id="4" name="Logo"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr></p:sp>
            <p:sp><p:nvSpPr><p:cNvPr id="5" name="Date 3"/><p:cNvSpPr/><p:nvPr><p:ph type="dt" idx="10"/></p:nvPr></p:nvSpPr></p:sp>
        </p:spTree></p:cSld></p:sldLayout>"#;
        let (name, placeholders) = parse_placeholders(xml).unwrap();
        assert_eq!(name, "Title Slide");
        assert_eq!(placeholders.len(), 3);
        assert!(placeholders[0].is_title());
        assert_eq!(placeholders[0].idx, 0);
        assert_eq!(placeholders[1].kind.as_deref(), Some("subTitle"));
        assert_eq!(placeholders[1].idx, 1);
        assert_eq!(placeholders[1].name, "Subtitle 2");
        assert!(!placeholders[2].is_cloneable());
    }

    #[test]
    fn test_fixture_template_layouts() {
        let package = Package::from_bytes(&fixture::template_bytes(36).unwrap()).unwrap();
        let template = Template::from_package(package).unwrap();
        assert_eq!(template.layouts().len(), 36);
        assert_eq!(template.master_part(), "ppt/slideMasters/slideMaster1.xml");
        assert_eq!(template.layout(0).unwrap().part, "ppt/slideLayouts/slideLayout1.xml");
        assert_eq!(template.layout(35).unwrap().part, "ppt/slideLayouts/slideLayout36.xml");
        assert!(template.layout(36).is_none());

        let size = template.slide_size();
        assert!((size.width_inches() - 13.333).abs() < 0.01);
        assert!((size.height_inches() - 7.5).abs() < 0.01);
    }

    #[test]
    fn test_find_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TEMPLATE_FILE);
        fixture::write_template(&path, 36).unwrap();
        assert_eq!(find_template(Some(&path)).unwrap(), path);
        assert!(matches!(
            find_template(Some(&dir.path().join("other.pptx"))),
            Err(Error::TemplateNotFound(_))
        ));
        assert!(template_candidates()[0].ends_with("templates/HyFlux_Template_-.pptx"));
    }

    #[test]
    fn test_missing_template_file() {
        let err = Template::open(Path::new("/nonexistent/HyFlux_Template_-.pptx")).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(_)));
    }
}
