#![forbid(unsafe_code)]

//! Object tree → XML element tree.
//!
//! Prefixes are assigned from a namespace scope stack: a namespace already
//! bound in scope reuses its prefix, otherwise the preferred prefix is
//! declared, falling back to a generated `nsN` when that prefix is taken.
//! Elements carrying an ID are recorded in an [`IdMap`] so `#id`
//! references resolve against the output. Formatting whitespace recorded on
//! the nodes is written back where it was read.

use crate::document::{Document, NodeId};
use crate::registry::{RegistryEntry, TypeRegistry};
use crate::signature::{
    ContentSigner, Placement, SignatureContext, SignatureState, SignedSignature,
};
use ulriksdal_core::{ns, Error, QName, Result};
use ulriksdal_xml::{IdMap, Namespace, XmlElement, XmlNode, MAX_DEPTH};

/// A marshalled element and the IDs it contains.
#[derive(Debug, Clone)]
pub struct Marshalled {
    pub element: XmlElement,
    /// ID value → element-child path from `element`.
    pub ids: IdMap,
    /// Bindings declared by ancestors left out of the output, outermost
    /// first. Only [`Marshaller::marshal_in_context`] fills this.
    pub inherited: Vec<Namespace>,
}

pub struct Marshaller<'a> {
    registry: &'a TypeRegistry,
    signer: Option<&'a dyn ContentSigner>,
}

impl<'a> Marshaller<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            signer: None,
        }
    }

    /// Use `signer` for nodes with a pending signature request.
    pub fn with_signer(mut self, signer: &'a dyn ContentSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Marshal `node`, computing any pending signatures and recording them
    /// in the nodes' signature contexts.
    pub fn marshal(&self, doc: &mut Document, node: NodeId) -> Result<Marshalled> {
        let mut signed = Vec::new();
        let marshalled = self.run(doc, node, Some(&mut signed), false)?;
        for (target, signature) in signed {
            doc.set_signature(target, Some(SignatureContext::signed(signature)))?;
        }
        Ok(marshalled)
    }

    /// Marshal without touching the document. A pending signature request
    /// is an error here.
    pub fn marshal_snapshot(&self, doc: &Document, node: NodeId) -> Result<Marshalled> {
        self.run(doc, node, None, false)
    }

    /// Marshal `node` the way it appears inside its tree, without touching
    /// the document.
    ///
    /// Ancestors contribute only their start tags' namespace declarations,
    /// so the subtree gets the prefixes a marshal of the whole tree would
    /// give it. Those bindings are returned in [`Marshalled::inherited`].
    /// Nothing outside the subtree is marshalled, so pending signatures
    /// elsewhere in the tree do not matter.
    pub fn marshal_in_context(&self, doc: &Document, node: NodeId) -> Result<Marshalled> {
        self.run(doc, node, None, true)
    }

    fn run(
        &self,
        doc: &Document,
        node: NodeId,
        signed: Option<&mut Vec<(NodeId, SignedSignature)>>,
        in_context: bool,
    ) -> Result<Marshalled> {
        tracing::debug!(element = %doc.node(node)?.name(), in_context, "marshalling");
        let mut state = State {
            scope: Vec::new(),
            path: Vec::new(),
            ids: IdMap::new(),
            signed,
        };
        let mut depth = 1;
        if in_context {
            let mut ancestors: Vec<NodeId> = doc.ancestors(node).collect();
            ancestors.reverse();
            depth += ancestors.len();
            for ancestor in ancestors {
                self.start_tag(doc, ancestor, &mut state.scope)?;
            }
        }
        let inherited = state.scope.clone();
        let element = self.element(doc, node, &mut state, depth)?;
        Ok(Marshalled {
            element,
            ids: state.ids,
            inherited,
        })
    }

    /// The element's name, declarations and attributes. Bindings it declares
    /// are pushed onto `scope`.
    fn start_tag(
        &self,
        doc: &Document,
        id: NodeId,
        scope: &mut Vec<Namespace>,
    ) -> Result<(XmlElement, &'a RegistryEntry)> {
        let node = doc.node(id)?;
        let entry = self.registry.lookup(node.name())?;
        let mut element = XmlElement::new(QName::local(node.name().local_name()));

        for decl in node.namespaces() {
            let current = lookup_uri(scope, &decl.prefix);
            let redundant = if decl.uri.is_empty() {
                current.is_none()
            } else {
                current == Some(decl.uri.as_str())
            };
            if !redundant {
                declare(&mut element, scope, &decl.prefix, &decl.uri);
            }
        }

        element.name = element_name(node.name(), &mut element, scope);

        entry.marshaller.marshall_attributes(doc, id, &mut element)?;
        qualify_attributes(&mut element, scope);
        Ok((element, entry))
    }

    fn element(
        &self,
        doc: &Document,
        id: NodeId,
        state: &mut State<'_>,
        depth: usize,
    ) -> Result<XmlElement> {
        let node = doc.node(id)?;
        if depth > MAX_DEPTH {
            return Err(Error::marshalling(
                node.name().clone(),
                format!("nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        tracing::trace!(element = %node.name(), "marshalling element");

        let mark = state.scope.len();
        let (mut element, entry) = self.start_tag(doc, id, &mut state.scope)?;

        if let Some(value) = node.id() {
            state.ids.insert(value, state.path.clone())?;
        }

        let context = node.signature();
        let pending = match context.map(SignatureContext::state) {
            Some(SignatureState::Pending(params)) => Some(params),
            _ => None,
        };
        if pending.is_some() {
            if state.signed.is_none() {
                return Err(Error::marshalling(
                    node.name().clone(),
                    "signature is pending; marshal with a signer first",
                ));
            }
            if node.id().is_none() {
                return Err(Error::marshalling(
                    node.name().clone(),
                    "signature requested but the element has no ID",
                ));
            }
            if self.signer.is_none() {
                return Err(Error::marshalling(
                    node.name().clone(),
                    "signature requested but no signer is configured",
                ));
            }
        }

        let children = node.children();
        let received = context.and_then(|c| {
            c.signed_signature()
                .map(|signature| (signature, c.placement()))
        });
        // Child position of the signature; later children's paths shift by one.
        let signature_at = if pending.is_some() {
            Some(0)
        } else {
            received.map(|(_, placement)| placement.index.min(children.len()))
        };

        entry.marshaller.marshall_content(doc, id, &mut element)?;

        for (index, child) in children.iter().enumerate() {
            if signature_at == Some(index) {
                if let Some((signature, placement)) = received {
                    push_signature(&mut element, signature, placement);
                }
            }
            if let Some(space) = doc.node(*child)?.leading_whitespace() {
                element.push_text(space);
            }
            let shift = usize::from(signature_at.is_some_and(|at| at <= index));
            state.path.push(index + shift);
            let child_element = self.element(doc, *child, state, depth + 1)?;
            state.path.pop();
            element.push_element(child_element);
        }
        if let Some((signature, placement)) = received {
            if signature_at == Some(children.len()) {
                push_signature(&mut element, signature, placement);
            }
        }
        if let Some(space) = node.closing_whitespace() {
            element.push_text(space);
        }

        if let (Some(params), Some(signer), Some(reference)) = (pending, self.signer, node.id()) {
            tracing::debug!(element = %node.name(), id = reference, "signing");
            let signature = signer.sign(reference, &element, &state.scope[..mark], params)?;
            element
                .children
                .insert(0, XmlNode::Element(signature.element().clone()));
            if let Some(signed) = state.signed.as_deref_mut() {
                signed.push((id, signature));
            }
        }

        state.scope.truncate(mark);
        Ok(element)
    }
}

fn push_signature(element: &mut XmlElement, signature: &SignedSignature, placement: &Placement) {
    if let Some(space) = &placement.leading_whitespace {
        element.push_text(space.as_str());
    }
    element.push_element(signature.element().clone());
}

struct State<'s> {
    /// Declarations in scope, outermost first; later entries shadow earlier.
    scope: Vec<Namespace>,
    path: Vec<usize>,
    ids: IdMap,
    signed: Option<&'s mut Vec<(NodeId, SignedSignature)>>,
}

/// The namespace bound to `prefix`, treating an undeclaration as unbound.
fn lookup_uri<'s>(scope: &'s [Namespace], prefix: &str) -> Option<&'s str> {
    scope
        .iter()
        .rev()
        .find(|n| n.prefix == prefix)
        .map(|n| n.uri.as_str())
        .filter(|uri| !uri.is_empty())
}

/// A prefix currently bound to `uri`.
fn lookup_prefix<'s>(scope: &'s [Namespace], uri: &str, allow_default: bool) -> Option<&'s str> {
    scope
        .iter()
        .rev()
        .filter(|n| n.uri == uri && (allow_default || !n.prefix.is_empty()))
        .map(|n| n.prefix.as_str())
        .find(|p| lookup_uri(scope, p) == Some(uri))
}

fn declare(element: &mut XmlElement, scope: &mut Vec<Namespace>, prefix: &str, uri: &str) {
    element.declare_namespace(prefix, uri);
    scope.push(Namespace::new(prefix, uri));
}

/// The preferred prefix if it is free, else the first free `nsN`.
fn choose_prefix(scope: &[Namespace], preferred: Option<&str>) -> String {
    if let Some(p) = preferred.filter(|p| !p.is_empty() && *p != ns::prefix::XML) {
        if lookup_uri(scope, p).is_none() {
            return p.to_owned();
        }
    }
    (1..)
        .map(|n| format!("ns{n}"))
        .find(|p| lookup_uri(scope, p).is_none())
        .unwrap_or_default()
}

fn element_name(name: &QName, element: &mut XmlElement, scope: &mut Vec<Namespace>) -> QName {
    if !name.has_namespace() {
        if lookup_uri(scope, "").is_some() {
            declare(element, scope, "", "");
        }
        return QName::local(name.local_name());
    }
    let uri = name.namespace();
    let prefix = match lookup_prefix(scope, uri, true) {
        Some(p) => p.to_owned(),
        None => {
            let p = choose_prefix(scope, name.prefix());
            declare(element, scope, &p, uri);
            p
        }
    };
    QName::new(uri, name.local_name()).with_prefix(prefix)
}

fn qualify_attributes(element: &mut XmlElement, scope: &mut Vec<Namespace>) {
    for index in 0..element.attributes.len() {
        let name = element.attributes[index].name.clone();
        if !name.has_namespace() {
            element.attributes[index].name = QName::local(name.local_name());
            continue;
        }
        let uri = name.namespace();
        let prefix = if uri == ns::XML {
            ns::prefix::XML.to_owned()
        } else if let Some(p) = lookup_prefix(scope, uri, false) {
            p.to_owned()
        } else {
            let preferred = name.prefix().or_else(|| known_prefix(uri));
            let p = choose_prefix(scope, preferred);
            declare(element, scope, &p, uri);
            p
        };
        element.attributes[index].name = QName::new(uri, name.local_name()).with_prefix(prefix);
    }
}

fn known_prefix(uri: &str) -> Option<&'static str> {
    match uri {
        ns::XSI => Some(ns::prefix::XSI),
        ns::DSIG => Some(ns::prefix::DSIG),
        ns::SAML2 => Some(ns::prefix::SAML2),
        ns::MD => Some(ns::prefix::MD),
        _ => None,
    }
}
