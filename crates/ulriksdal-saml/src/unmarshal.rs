#![forbid(unsafe_code)]

//! XML element tree → object tree.
//!
//! Unmarshalling is all-or-nothing: on the first violation every node the
//! call created is discarded and the error is wrapped in
//! [`Error::Unmarshalling`] naming the root element.

use crate::document::{Document, NodeId};
use crate::registry::TypeRegistry;
use crate::signature::{Placement, SignatureContext, SignedSignature};
use ulriksdal_core::{ns, Error, QName, Result};
use ulriksdal_xml::{XmlElement, XmlNode};

/// What to do with elements, attributes and text no type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownContentPolicy {
    #[default]
    Fail,
    /// Drop the content with a warning.
    Skip,
}

#[derive(Debug, Clone, Copy)]
pub struct UnmarshallerConfig {
    pub policy: UnknownContentPolicy,
    /// Deepest element nesting accepted; parsing enforces it as well.
    pub max_depth: usize,
}

impl Default for UnmarshallerConfig {
    fn default() -> Self {
        Self {
            policy: UnknownContentPolicy::default(),
            max_depth: ulriksdal_xml::MAX_DEPTH,
        }
    }
}

impl UnmarshallerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: UnknownContentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn lenient() -> Self {
        Self::new().with_policy(UnknownContentPolicy::Skip)
    }
}

pub struct Unmarshaller<'r> {
    registry: &'r TypeRegistry,
    config: UnmarshallerConfig,
}

impl<'r> Unmarshaller<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_config(registry, UnmarshallerConfig::default())
    }

    pub fn with_config(registry: &'r TypeRegistry, config: UnmarshallerConfig) -> Self {
        Self { registry, config }
    }

    pub fn policy(&self) -> UnknownContentPolicy {
        self.config.policy
    }

    /// Build a detached tree for `element` inside `doc`.
    ///
    /// An unregistered document element is an [`Error::UnknownElement`]
    /// under either policy.
    pub fn unmarshal(&self, doc: &mut Document, element: &XmlElement) -> Result<NodeId> {
        tracing::debug!(element = %element.name, policy = ?self.config.policy, "unmarshalling");
        if !self.registry.contains(&element.name) {
            let unknown = Error::UnknownElement {
                parent: document_node(),
                element: element.name.clone(),
            };
            return Err(Error::unmarshalling(element.name.clone(), unknown));
        }
        let mark = doc.checkpoint();
        match self.element(doc, element, 1) {
            Ok(node) => Ok(node),
            Err(err) => {
                doc.rollback(mark);
                tracing::debug!(element = %element.name, error = %err, "unmarshalling failed");
                Err(Error::unmarshalling(element.name.clone(), err))
            }
        }
    }

    /// Parse and unmarshal a document.
    pub fn unmarshal_str(&self, doc: &mut Document, xml: &str) -> Result<NodeId> {
        let element = ulriksdal_xml::parse_with_max_depth(xml, self.config.max_depth)?;
        self.unmarshal(doc, &element)
    }

    fn element(&self, doc: &mut Document, element: &XmlElement, depth: usize) -> Result<NodeId> {
        if depth > self.config.max_depth {
            return Err(Error::UnexpectedContent {
                element: element.name.clone(),
                detail: format!("nested deeper than {} levels", self.config.max_depth),
            });
        }
        let entry = self.registry.lookup(&element.name)?;
        tracing::trace!(element = %element.name, "unmarshalling element");
        let node = entry.builder.build(doc, &element.name);

        for decl in &element.namespaces {
            doc.declare_namespace(node, decl.clone())?;
        }

        for attr in &element.attributes {
            match entry.unmarshaller.process_attribute(doc, node, attr) {
                Err(Error::UnknownAttribute { element, attribute }) if self.skipping() => {
                    tracing::warn!(%element, %attribute, "dropping unknown attribute");
                }
                other => other?,
            }
        }

        // Whitespace between the children of element-only content is
        // formatting; it is kept on the nodes so signed bytes reproduce.
        let element_only = !doc.node(node)?.capabilities().text;
        let text = element.text();
        if !text.is_empty() && !(element_only && is_formatting(&text)) {
            match entry.unmarshaller.process_text(doc, node, &text) {
                Err(Error::UnexpectedContent { element, detail }) if self.skipping() => {
                    tracing::warn!(%element, %detail, "dropping unexpected text");
                }
                other => other?,
            }
        }

        let mut space = String::new();
        for child in &element.children {
            let child = match child {
                XmlNode::Element(child) => child,
                XmlNode::Text(t) => {
                    if element_only && is_formatting(t) {
                        space.push_str(t);
                    }
                    continue;
                }
                XmlNode::Comment(_) => continue,
            };
            let leading = Some(std::mem::take(&mut space)).filter(|s| !s.is_empty());

            if child.name.is(ns::DSIG, ns::node::SIGNATURE) && doc.node(node)?.is_signable() {
                self.signature(doc, node, element, child, leading)?;
                continue;
            }
            if !self.registry.contains(&child.name) {
                self.unknown(element, child)?;
                continue;
            }
            let child_node = self.element(doc, child, depth + 1)?;
            match entry.unmarshaller.process_child(doc, node, child_node) {
                Ok(()) => doc.set_leading_whitespace(child_node, leading)?,
                Err(Error::UnknownElement { parent, element }) if self.skipping() => {
                    tracing::warn!(%parent, %element, "dropping unknown element");
                    doc.remove(child_node)?;
                }
                Err(err) => return Err(err),
            }
        }
        if !space.is_empty() {
            doc.set_closing_whitespace(node, Some(space))?;
        }
        Ok(node)
    }

    fn signature(
        &self,
        doc: &mut Document,
        node: NodeId,
        parent: &XmlElement,
        child: &XmlElement,
        leading_whitespace: Option<String>,
    ) -> Result<()> {
        if doc.signature(node).is_some() {
            return Err(Error::UnexpectedContent {
                element: parent.name.clone(),
                detail: "more than one ds:Signature".into(),
            });
        }
        let signature = SignedSignature::from_element(child.clone())?;
        tracing::trace!(element = %parent.name, reference = signature.reference_uri(), "captured signature");
        let placement = Placement {
            index: doc.children(node).len(),
            leading_whitespace,
        };
        let context = SignatureContext::signed(signature).with_placement(placement);
        doc.set_signature(node, Some(context))
    }

    fn unknown(&self, parent: &XmlElement, child: &XmlElement) -> Result<()> {
        if self.skipping() {
            tracing::warn!(parent = %parent.name, element = %child.name, "dropping unknown element");
            return Ok(());
        }
        Err(Error::UnknownElement {
            parent: parent.name.clone(),
            element: child.name.clone(),
        })
    }

    fn skipping(&self) -> bool {
        self.config.policy == UnknownContentPolicy::Skip
    }
}

/// Stand-in parent name for the document element.
fn document_node() -> QName {
    QName::local("#document")
}

fn is_formatting(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
