//! In-memory OPC package: the ZIP parts of a .pptx plus helpers for the
//! relationship and content-type parts.

use crate::xml::{attr, local_name, write_error, xml_error};
use hyflux_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";
pub const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
}

pub mod content_types {
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
}

/// Upper bound on the buffer reserved from a ZIP entry's declared size.
const MAX_RESERVE_BYTES: u64 = 16 * 1024 * 1024;

const NS_PACKAGE_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`: the target is a URL, not a package part.
    pub external: bool,
}

impl Relationship {
    pub fn new(id: impl Into<String>, rel_type: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external: false,
        }
    }
}

/// Parsed `[Content_Types].xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// (extension, content type)
    pub defaults: Vec<(String, String)>,
    /// (part name with leading `/`, content type)
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Add or replace the override for `part` (a package path without `/`).
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let name = format!("/{}", part);
        self.overrides.retain(|(p, _)| *p != name);
        self.overrides.push((name, content_type.to_string()));
    }

    /// Drop overrides whose part name (without `/`) matches `pred`.
    pub fn remove_overrides(&mut self, pred: impl Fn(&str) -> bool) {
        self.overrides
            .retain(|(p, _)| !pred(p.trim_start_matches('/')));
    }
}

/// All parts of a package, in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Read a package from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(reserve_hint(file.size()));
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push((name, data));
        }

        Ok(Self { parts })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// A part decoded as UTF-8 XML.
    pub fn part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::PackageError(format!("Part not found in package '{}'", name)))?;
        std::str::from_utf8(data)
            .map_err(|e| Error::PackageError(format!("Part '{}' is not UTF-8: {}", name, e)))
    }

    /// Insert or replace a part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    /// Remove every part whose name matches `pred`; returns how many went.
    pub fn remove_parts(&mut self, pred: impl Fn(&str) -> bool) -> usize {
        let before = self.parts.len();
        self.parts.retain(|(name, _)| !pred(name));
        before - self.parts.len()
    }

    /// Relationships of `part` (`""` for the package root). A part without
    /// a `.rels` part has no relationships.
    pub fn relationships(&self, part: &str) -> Result<Vec<Relationship>> {
        let rels = rels_path(part);
        if !self.contains(&rels) {
            return Ok(Vec::new());
        }
        parse_relationships(self.part_str(&rels)?)
    }

    pub fn set_relationships(&mut self, part: &str, rels: &[Relationship]) -> Result<()> {
        let xml = write_relationships(rels)?;
        self.set_part(&rels_path(part), xml);
        Ok(())
    }

    pub fn content_types(&self) -> Result<ContentTypes> {
        parse_content_types(self.part_str(CONTENT_TYPES_PART)?)
    }

    pub fn set_content_types(&mut self, types: &ContentTypes) -> Result<()> {
        let xml = write_content_types(types)?;
        self.set_part(CONTENT_TYPES_PART, xml);
        Ok(())
    }

    /// Serialize the package as a ZIP archive. `[Content_Types].xml` goes first.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name == CONTENT_TYPES_PART)
            .chain(self.parts.iter().filter(|(name, _)| name != CONTENT_TYPES_PART));

        for (name, data) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data)?;
        }
        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(())
    }

    /// Write the package to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Path of the `.rels` part that belongs to `part`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Target of `part` as seen from a part in `source_dir` one level below `ppt/`.
pub fn relative_target(from_part: &str, to_part: &str) -> String {
    let from_dir: Vec<&str> = match from_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to: Vec<&str> = to_part.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; from_dir.len() - common];
    segments.extend(&to[common..]);
    segments.join("/")
}

/// Next free `rIdN` among `rels`.
pub fn next_relationship_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error("Error parsing relationships"))? {
            Event::Empty(ref e) | Event::Start(ref e) if local_name(e.name().as_ref()) == b"Relationship" => {
                let (Some(id), Some(rel_type), Some(target)) =
                    (attr(e, b"Id"), attr(e, b"Type"), attr(e, b"Target"))
                else {
                    log::warn!("Skipping incomplete relationship entry");
                    continue;
                };
                let external = attr(e, b"TargetMode").as_deref() == Some("External");
                rels.push(Relationship {
                    id,
                    rel_type,
                    target,
                    external,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

fn write_relationships(rels: &[Relationship]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("Relationships").with_attributes([("xmlns", NS_PACKAGE_RELATIONSHIPS)]),
        ))
        .map_err(write_error)?;
    for rel in rels {
        let mut e = BytesStart::new("Relationship");
        e.push_attribute(("Id", rel.id.as_str()));
        e.push_attribute(("Type", rel.rel_type.as_str()));
        e.push_attribute(("Target", rel.target.as_str()));
        if rel.external {
            e.push_attribute(("TargetMode", "External"));
        }
        writer.write_event(Event::Empty(e)).map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Relationships")))
        .map_err(write_error)?;
    Ok(writer.into_inner())
}

fn parse_content_types(xml: &str) -> Result<ContentTypes> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut types = ContentTypes::default();

    loop {
        match reader.read_event().map_err(xml_error("Error parsing content types"))? {
            Event::Empty(ref e) | Event::Start(ref e) => match local_name(e.name().as_ref()) {
                b"Default" => {
                    if let (Some(ext), Some(ct)) = (attr(e, b"Extension"), attr(e, b"ContentType")) {
                        types.defaults.push((ext, ct));
                    }
                }
                b"Override" => {
                    if let (Some(part), Some(ct)) = (attr(e, b"PartName"), attr(e, b"ContentType")) {
                        types.overrides.push((part, ct));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(types)
}

fn write_content_types(types: &ContentTypes) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("Types").with_attributes([("xmlns", NS_CONTENT_TYPES)]),
        ))
        .map_err(write_error)?;
    for (ext, ct) in &types.defaults {
        let e = BytesStart::new("Default")
            .with_attributes([("Extension", ext.as_str()), ("ContentType", ct.as_str())]);
        writer.write_event(Event::Empty(e)).map_err(write_error)?;
    }
    for (part, ct) in &types.overrides {
        let e = BytesStart::new("Override")
            .with_attributes([("PartName", part.as_str()), ("ContentType", ct.as_str())]);
        writer.write_event(Event::Empty(e)).map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Types")))
        .map_err(write_error)?;
    Ok(writer.into_inner())
}

/// Initial buffer size for an entry. The declared size is untrusted.
fn reserve_hint(declared: u64) -> usize {
    declared.min(MAX_RESERVE_BYTES) as usize
}
