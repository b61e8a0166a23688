#![forbid(unsafe_code)]

//! Serializing an [`XmlElement`] tree with quick-xml.

use crate::element::{qualified, XmlElement, XmlNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use ulriksdal_core::Error;

/// Serialize without indentation or XML declaration.
pub fn to_string(element: &XmlElement) -> Result<String, Error> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element, false, 1)?;
    into_string(writer)
}

/// Serialize with an XML declaration and two-space indentation.
///
/// Whitespace-only text between child elements is replaced by fresh
/// indentation, so the output of this function is for display and will not
/// verify if the tree is signed.
pub fn to_string_pretty(element: &XmlElement) -> Result<String, Error> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;
    write_element(&mut writer, element, true, 1)?;
    into_string(writer)
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
    pretty: bool,
    depth: usize,
) -> Result<(), Error> {
    let name = element.qualified_name();
    if depth > crate::MAX_DEPTH {
        return Err(Error::XmlWrite(format!(
            "{name} is nested deeper than {} levels",
            crate::MAX_DEPTH
        )));
    }
    let mut start = BytesStart::new(name.as_str());
    for ns in &element.namespaces {
        let key = if ns.prefix.is_empty() {
            "xmlns".to_owned()
        } else {
            format!("xmlns:{}", ns.prefix)
        };
        start.push_attribute((key.as_str(), ns.uri.as_str()));
    }
    for attr in &element.attributes {
        let key = qualified(&attr.name);
        start.push_attribute((key.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_err)?;
        return Ok(());
    }

    let reindent = pretty && element.child_elements().next().is_some();
    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e, pretty, depth + 1)?,
            XmlNode::Text(t) if reindent && t.trim().is_empty() => {}
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(write_err)?,
            XmlNode::Comment(c) => writer
                .write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                .map_err(write_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_err)?;
    Ok(())
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String, Error> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::XmlWrite(format!("invalid UTF-8 output: {e}")))
}

fn write_err(e: impl std::fmt::Display) -> Error {
    Error::XmlWrite(e.to_string())
}
