#![forbid(unsafe_code)]

//! Owned XML element tree.
//!
//! This is the wire-side representation the object model marshals to and
//! unmarshals from. Names keep the prefix they were written with so a
//! serialized tree reproduces the input's prefixes.

use ulriksdal_core::QName;

/// A namespace declaration. An empty prefix is the default namespace; an
/// empty URI undeclares the default namespace (`xmlns=""`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    pub uri: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.prefix.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: QName,
    pub namespaces: Vec<Namespace>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The name as written: `prefix:local` or `local`.
    pub fn qualified_name(&self) -> String {
        qualified(&self.name)
    }

    pub fn declare_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let ns = Namespace::new(prefix, uri);
        if let Some(existing) = self.namespaces.iter_mut().find(|n| n.prefix == ns.prefix) {
            existing.uri = ns.uri;
        } else {
            self.namespaces.push(ns);
        }
    }

    /// Namespace bound to `prefix` by a declaration on this element only.
    pub fn declared_namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|n| n.prefix == prefix)
            .map(|n| n.uri.as_str())
    }

    // ── Attributes ───────────────────────────────────────────────────

    pub fn attribute(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local_name))
            .map(|a| a.value.as_str())
    }

    /// Unqualified attribute lookup.
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attribute("", local_name)
    }

    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == name) {
            existing.name = name;
            existing.value = value;
        } else {
            self.attributes.push(XmlAttribute { name, value });
        }
    }

    pub fn with_attr(mut self, local_name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(QName::local(local_name), value);
        self
    }

    // ── Children ─────────────────────────────────────────────────────

    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push_element(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn find_child(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.child_elements()
            .find(|e| e.name.is(namespace, local_name))
    }

    pub fn find_children<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements()
            .filter(move |e| e.name.is(namespace, local_name))
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let XmlNode::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    /// Follow a path of element-child indices from this element.
    pub fn at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &idx in path {
            current = current.child_elements().nth(idx)?;
        }
        Some(current)
    }

    /// Remove every direct element child with this name; returns how many.
    pub fn remove_children(&mut self, namespace: &str, local_name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| match c {
            XmlNode::Element(e) => !e.name.is(namespace, local_name),
            _ => true,
        });
        before - self.children.len()
    }
}

pub(crate) fn qualified(name: &QName) -> String {
    match name.prefix() {
        Some(p) if !p.is_empty() => format!("{p}:{}", name.local_name()),
        _ => name.local_name().to_owned(),
    }
}
