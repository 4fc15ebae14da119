//! Small helpers shared by the XML readers and writers.

use hyflux_core::Error;
use quick_xml::events::BytesStart;
use std::fmt::Display;

pub(crate) const NS_PRESENTATION: &str =
    "http://schemas.openxmlformats.org/presentationml/2006/main";
pub(crate) const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Value of the attribute whose qualified name is `key`.
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Value of the attribute whose local name is `key`, whatever its prefix.
pub(crate) fn attr_local(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

pub(crate) fn xml_error(context: &str) -> impl Fn(quick_xml::Error) -> Error + '_ {
    move |e| Error::XmlError(format!("{}: {}", context, e))
}

pub(crate) fn write_error<E: Display>(e: E) -> Error {
    Error::XmlError(format!("Failed to write XML: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_attr_lookup() {
        let e = BytesStart::new("p:sldId").with_attributes([("id", "256"), ("r:id", "rId7")]);
        assert_eq!(attr(&e, b"id").as_deref(), Some("256"));
        assert_eq!(attr(&e, b"r:id").as_deref(), Some("rId7"));
        assert_eq!(attr_local(&e, b"id").as_deref(), Some("256"));
        assert_eq!(attr(&e, b"missing"), None);
    }
}
