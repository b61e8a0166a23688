#![forbid(unsafe_code)]

//! Parsing XML text into an owned [`XmlElement`] tree via roxmltree.

use crate::element::{Namespace, XmlElement, XmlNode};
use ulriksdal_core::{ns, Error, QName};

/// Parse XML text and return the document element.
pub fn parse(text: &str) -> Result<XmlElement, Error> {
    parse_with_max_depth(text, crate::MAX_DEPTH)
}

/// Parse XML text, refusing documents nested deeper than `max_depth`
/// elements.
pub fn parse_with_max_depth(text: &str, max_depth: usize) -> Result<XmlElement, Error> {
    let doc = roxmltree::Document::parse_with_options(text, crate::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    let root = doc.root_element();
    tracing::trace!(element = root.tag_name().name(), "parsed XML document");
    convert(root, &[], 1, max_depth)
}

/// Parse XML from bytes, which must be UTF-8.
pub fn parse_bytes(data: &[u8]) -> Result<XmlElement, Error> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?;
    parse(text)
}

/// In-scope bindings of a roxmltree node, excluding the implicit `xml` one.
fn in_scope(node: roxmltree::Node<'_, '_>) -> Vec<Namespace> {
    node.namespaces()
        .filter(|n| n.name() != Some(ns::prefix::XML))
        .map(|n| Namespace::new(n.name().unwrap_or(""), n.uri()))
        .collect()
}

fn convert(
    node: roxmltree::Node<'_, '_>,
    parent_scope: &[Namespace],
    depth: usize,
    max_depth: usize,
) -> Result<XmlElement, Error> {
    if depth > max_depth {
        return Err(Error::XmlParse(format!(
            "element <{}> is nested deeper than {max_depth} levels",
            node.tag_name().name()
        )));
    }
    let scope = in_scope(node);

    let mut name = QName::new(
        node.tag_name().namespace().unwrap_or(""),
        node.tag_name().name(),
    );
    if let Some(uri) = node.tag_name().namespace() {
        if let Some(p) = node.lookup_prefix(uri) {
            name = name.with_prefix(p);
        }
    }

    let mut element = XmlElement::new(name);

    // Declarations are the bindings that differ from the parent's scope.
    for binding in &scope {
        if !parent_scope.contains(binding) {
            element.namespaces.push(binding.clone());
        }
    }
    let parent_default = parent_scope.iter().any(|n| n.is_default() && !n.uri.is_empty());
    let own_default = scope.iter().any(|n| n.is_default());
    if parent_default && !own_default {
        element.namespaces.push(Namespace::new("", ""));
    }

    for attr in node.attributes() {
        let attr_name = match attr.namespace() {
            Some(uri) => {
                let mut qn = QName::new(uri, attr.name());
                if uri == ns::XML {
                    qn = qn.with_prefix(ns::prefix::XML);
                } else if let Some(binding) = scope.iter().find(|n| !n.is_default() && n.uri == uri) {
                    qn = qn.with_prefix(binding.prefix.clone());
                }
                qn
            }
            None => QName::local(attr.name()),
        };
        element.attributes.push(crate::XmlAttribute {
            name: attr_name,
            value: attr.value().to_owned(),
        });
    }

    for child in node.children() {
        if child.is_element() {
            let child = convert(child, &scope, depth + 1, max_depth)?;
            element.children.push(XmlNode::Element(child));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                element.children.push(XmlNode::Text(t.to_owned()));
            }
        } else if child.is_comment() {
            if let Some(t) = child.text() {
                element.children.push(XmlNode::Comment(t.to_owned()));
            }
        }
    }

    Ok(element)
}
