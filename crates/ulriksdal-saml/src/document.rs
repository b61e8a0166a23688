#![forbid(unsafe_code)]

//! Arena-backed object tree.
//!
//! Nodes live in a [`Document`] and are addressed by [`NodeId`]. Each node
//! records its parent index, so ancestor walks are O(1) per step. The
//! document also owns the ID map: an ID value names at most one node.

use std::collections::HashMap;

use crate::kind::ElementKind;
use crate::signature::{SignatureContext, SignatureParams};
use ulriksdal_core::{ns, Error, QName, Result};
use ulriksdal_xml::Namespace;

/// Index of a node within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node of a given type may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub attributes: bool,
    pub children: bool,
    pub text: bool,
    pub signable: bool,
    /// Local name of the unqualified attribute holding the node's ID.
    pub id_attribute: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct Node {
    name: QName,
    kind: Option<ElementKind>,
    caps: Capabilities,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(QName, String)>,
    text: Option<String>,
    id: Option<String>,
    namespaces: Vec<Namespace>,
    signature: Option<SignatureContext>,
    leading_whitespace: Option<String>,
    closing_whitespace: Option<String>,
}

impl Node {
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// The built-in kind, or `None` for types registered by applications.
    pub fn kind(&self) -> Option<ElementKind> {
        self.kind
    }

    pub fn is(&self, kind: ElementKind) -> bool {
        self.kind == Some(kind)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn is_signable(&self) -> bool {
        self.caps.signable
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> &[(QName, String)] {
        &self.attributes
    }

    pub fn attribute(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.is(namespace, local_name))
            .map(|(_, v)| v.as_str())
    }

    /// Unqualified attribute lookup.
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attribute("", local_name)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Namespace declarations carried over from the parsed element. They
    /// are re-declared on marshal so prefixes survive a round trip.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn signature(&self) -> Option<&SignatureContext> {
        self.signature.as_ref()
    }

    /// Formatting whitespace written before this element inside its parent.
    pub fn leading_whitespace(&self) -> Option<&str> {
        self.leading_whitespace.as_deref()
    }

    /// Formatting whitespace written before this element's end tag.
    pub fn closing_whitespace(&self) -> Option<&str> {
        self.closing_whitespace.as_deref()
    }
}

/// Marks the arena length so a failed operation can discard what it built.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint(usize);

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    ids: HashMap<String, NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node. Normally called by an
    /// [`ObjectBuilder`](crate::registry::ObjectBuilder).
    pub fn create_node(&mut self, name: QName, caps: Capabilities) -> NodeId {
        let id = NodeId(self.nodes.len());
        let kind = ElementKind::from_qname(&name);
        self.nodes.push(Some(Node {
            name,
            kind,
            caps,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            text: None,
            id: None,
            namespaces: Vec::new(),
            signature: None,
            leading_whitespace: None,
            closing_whitespace: None,
        }));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| Error::Tree(format!("no live node at index {}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::Tree(format!("no live node at index {}", id.0)))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Structure ────────────────────────────────────────────────────

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Children of a built-in kind, in order.
    pub fn children_of_kind(
        &self,
        id: NodeId,
        kind: ElementKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.get(*c).is_some_and(|n| n.is(kind)))
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: ElementKind) -> Option<NodeId> {
        self.children_of_kind(id, kind).next()
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// The topmost ancestor, or the node itself when detached.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// The node and all its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Append `child` under `parent`, detaching it from any prior parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(Error::Tree("a node cannot be attached beneath itself".into()));
        }
        if !self.node(parent)?.caps.children {
            return Err(Error::Tree(format!(
                "{} does not accept child elements",
                self.node(parent)?.name
            )));
        }
        self.detach(child)?;
        let node = self.node_mut(parent)?;
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove a node from its parent's child list. The node stays alive.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Detach and destroy a node with its subtree, releasing their IDs.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        for node_id in self.descendants(id) {
            if let Some(node) = self.nodes[node_id.0].take() {
                if let Some(value) = node.id {
                    self.ids.remove(&value);
                }
            }
        }
        Ok(())
    }

    // ── Attributes and content ───────────────────────────────────────

    /// Set an attribute. The node's ID attribute is routed through
    /// [`Document::set_id`] so uniqueness is enforced.
    pub fn set_attribute(&mut self, id: NodeId, name: QName, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let node = self.node(id)?;
        if !name.has_namespace() && node.caps.id_attribute == Some(name.local_name()) {
            return self.set_id(id, value);
        }
        if !node.caps.attributes && name.namespace() != ns::XSI {
            return Err(Error::Tree(format!("{} does not carry attributes", node.name)));
        }
        let node = self.node_mut(id)?;
        if let Some(slot) = node.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            node.attributes.push((name, value));
        }
        Ok(())
    }

    /// Set an unqualified attribute.
    pub fn set_attr(&mut self, id: NodeId, local_name: &str, value: impl Into<String>) -> Result<()> {
        self.set_attribute(id, QName::local(local_name), value)
    }

    pub fn remove_attribute(&mut self, id: NodeId, namespace: &str, local_name: &str) -> Result<()> {
        let node = self.node(id)?;
        if namespace.is_empty() && node.caps.id_attribute == Some(local_name) {
            return self.clear_id(id);
        }
        self.node_mut(id)?
            .attributes
            .retain(|(n, _)| !n.is(namespace, local_name));
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: Option<String>) -> Result<()> {
        let node = self.node_mut(id)?;
        if text.is_some() && !node.caps.text {
            return Err(Error::Tree(format!("{} does not carry text content", node.name)));
        }
        node.text = text;
        Ok(())
    }

    pub fn declare_namespace(&mut self, id: NodeId, namespace: Namespace) -> Result<()> {
        let node = self.node_mut(id)?;
        if let Some(existing) = node.namespaces.iter_mut().find(|n| n.prefix == namespace.prefix) {
            *existing = namespace;
        } else {
            node.namespaces.push(namespace);
        }
        Ok(())
    }

    /// Set the whitespace marshalled before the node inside its parent.
    ///
    /// Unmarshalling records the source document's indentation here, so a
    /// signature over indented content still verifies.
    pub fn set_leading_whitespace(&mut self, id: NodeId, space: Option<String>) -> Result<()> {
        let space = checked_whitespace(space)?;
        self.node_mut(id)?.leading_whitespace = space;
        Ok(())
    }

    /// Set the whitespace marshalled after the node's last child.
    pub fn set_closing_whitespace(&mut self, id: NodeId, space: Option<String>) -> Result<()> {
        let space = checked_whitespace(space)?;
        self.node_mut(id)?.closing_whitespace = space;
        Ok(())
    }

    // ── IDs ──────────────────────────────────────────────────────────

    /// Assign the node's ID, failing if another node already holds it.
    pub fn set_id(&mut self, id: NodeId, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let node = self.node(id)?;
        let Some(attr_name) = node.caps.id_attribute else {
            return Err(Error::Tree(format!("{} has no ID attribute", node.name)));
        };
        match self.ids.get(&value) {
            Some(owner) if *owner == id => return Ok(()),
            Some(_) => return Err(Error::DuplicateId(value)),
            None => {}
        }
        self.clear_id(id)?;
        self.ids.insert(value.clone(), id);
        let node = self.node_mut(id)?;
        node.attributes.push((QName::local(attr_name), value.clone()));
        node.id = Some(value);
        Ok(())
    }

    fn clear_id(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        let Some(old) = node.id.take() else {
            return Ok(());
        };
        if let Some(attr_name) = node.caps.id_attribute {
            node.attributes
                .retain(|(n, _)| n.has_namespace() || n.local_name() != attr_name);
        }
        self.ids.remove(&old);
        Ok(())
    }

    pub fn id(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::id)
    }

    pub fn lookup_id(&self, value: &str) -> Option<NodeId> {
        self.ids.get(value).copied()
    }

    // ── Signatures ───────────────────────────────────────────────────

    /// Ask for the node to be signed at its next marshal. Replaces any
    /// signature the node already carries.
    pub fn request_signature(&mut self, id: NodeId, params: SignatureParams) -> Result<()> {
        self.set_signature(id, Some(SignatureContext::pending(params)))
    }

    pub fn set_signature(&mut self, id: NodeId, context: Option<SignatureContext>) -> Result<()> {
        let node = self.node_mut(id)?;
        if context.is_some() && !node.caps.signable {
            return Err(Error::Tree(format!("{} is not signable", node.name)));
        }
        node.signature = context;
        Ok(())
    }

    pub fn signature(&self, id: NodeId) -> Option<&SignatureContext> {
        self.get(id).and_then(Node::signature)
    }

    // ── Transactions ─────────────────────────────────────────────────

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.nodes.len())
    }

    /// Drop every node created since `mark`.
    ///
    /// Only valid when nothing older was linked to the new nodes, which
    /// holds for unmarshalling: it builds a fresh detached tree.
    pub(crate) fn rollback(&mut self, mark: Checkpoint) {
        let Checkpoint(len) = mark;
        self.ids.retain(|_, node| node.0 < len);
        self.nodes.truncate(len);
    }
}

fn checked_whitespace(space: Option<String>) -> Result<Option<String>> {
    match space {
        Some(s) if !s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')) => Err(Error::Tree(
            format!("formatting text must be whitespace, found {s:?}"),
        )),
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: Capabilities = Capabilities {
        attributes: true,
        children: true,
        text: false,
        signable: true,
        id_attribute: Some("ID"),
    };

    fn node(doc: &mut Document, local: &str) -> NodeId {
        doc.create_node(QName::new("urn:x", local), FULL)
    }

    #[test]
    fn test_append_moves_between_parents() {
        let mut doc = Document::new();
        let a = node(&mut doc, "A");
        let b = node(&mut doc, "B");
        let leaf = node(&mut doc, "Leaf");

        doc.append_child(a, leaf).unwrap();
        assert_eq!(doc.parent(leaf), Some(a));

        doc.append_child(b, leaf).unwrap();
        assert_eq!(doc.parent(leaf), Some(b));
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[leaf]);
    }

    #[test]
    fn test_no_cycles() {
        let mut doc = Document::new();
        let a = node(&mut doc, "A");
        let b = node(&mut doc, "B");
        doc.append_child(a, b).unwrap();
        assert!(matches!(doc.append_child(b, a), Err(Error::Tree(_))));
        assert!(matches!(doc.append_child(a, a), Err(Error::Tree(_))));
    }

    #[test]
    fn test_id_unique_at_assignment() {
        let mut doc = Document::new();
        let a = node(&mut doc, "A");
        let b = node(&mut doc, "B");
        doc.set_id(a, "x").unwrap();
        assert!(matches!(doc.set_id(b, "x"), Err(Error::DuplicateId(v)) if v == "x"));
        // through the attribute path as well
        assert!(matches!(doc.set_attr(b, "ID", "x"), Err(Error::DuplicateId(_))));
        assert_eq!(doc.lookup_id("x"), Some(a));

        doc.set_id(a, "y").unwrap();
        assert_eq!(doc.lookup_id("x"), None);
        assert_eq!(doc.get(a).unwrap().attr("ID"), Some("y"));
        doc.set_id(b, "x").unwrap();
    }

    #[test]
    fn test_remove_releases_ids() {
        let mut doc = Document::new();
        let a = node(&mut doc, "A");
        let b = node(&mut doc, "B");
        doc.append_child(a, b).unwrap();
        doc.set_id(b, "child").unwrap();
        doc.remove(a).unwrap();
        assert!(!doc.contains(b));
        assert_eq!(doc.lookup_id("child"), None);
    }

    #[test]
    fn test_rollback() {
        let mut doc = Document::new();
        let keep = node(&mut doc, "Keep");
        doc.set_id(keep, "k").unwrap();
        let mark = doc.checkpoint();
        let gone = node(&mut doc, "Gone");
        doc.set_id(gone, "g").unwrap();
        doc.rollback(mark);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.lookup_id("g"), None);
        assert_eq!(doc.lookup_id("k"), Some(keep));
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let mut doc = Document::new();
        let a = node(&mut doc, "A");
        let b = node(&mut doc, "B");
        let c = node(&mut doc, "C");
        let d = node(&mut doc, "D");
        doc.append_child(a, b).unwrap();
        doc.append_child(b, c).unwrap();
        doc.append_child(a, d).unwrap();
        assert_eq!(doc.ancestors(c).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(doc.root_of(c), a);
        assert_eq!(doc.descendants(a), vec![a, b, c, d]);
    }

    #[test]
    fn test_formatting_whitespace() {
        let mut doc = Document::new();
        let a = node(&mut doc, "A");
        doc.set_leading_whitespace(a, Some("\n  ".into())).unwrap();
        doc.set_closing_whitespace(a, Some(String::new())).unwrap();
        assert_eq!(doc.node(a).unwrap().leading_whitespace(), Some("\n  "));
        assert_eq!(doc.node(a).unwrap().closing_whitespace(), None);
        assert!(matches!(
            doc.set_closing_whitespace(a, Some(" x ".into())),
            Err(Error::Tree(_))
        ));
    }

    #[test]
    fn test_capabilities_enforced() {
        let mut doc = Document::new();
        let plain = doc.create_node(QName::new("urn:x", "Plain"), Capabilities::default());
        let other = node(&mut doc, "A");
        assert!(doc.set_id(plain, "p").is_err());
        assert!(doc.set_text(plain, Some("t".into())).is_err());
        assert!(doc.append_child(plain, other).is_err());
        assert!(doc.request_signature(plain, SignatureParams::default()).is_err());
    }
}
