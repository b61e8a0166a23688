#![forbid(unsafe_code)]

//! The type registry: qualified name → builder, marshaller, unmarshaller and
//! validators.
//!
//! Registration happens on a [`TypeRegistryBuilder`]. [`TypeRegistryBuilder::build`]
//! freezes it into a [`TypeRegistry`] that the engines borrow.

use std::collections::HashMap;
use std::sync::Arc;

use crate::binding::{BindingHandler, ElementBinding};
use crate::document::{Document, NodeId};
use crate::kind::ElementKind;
use ulriksdal_core::{Error, QName, Result, ValidationError};
use ulriksdal_xml::{XmlAttribute, XmlElement};

/// Creates an empty node for a qualified name.
pub trait ObjectBuilder: Send + Sync {
    fn build(&self, doc: &mut Document, name: &QName) -> NodeId;
}

/// Writes a node's own data onto its element.
///
/// Child nodes and the signature are handled by the marshalling engine.
pub trait ObjectMarshaller: Send + Sync {
    fn marshall_attributes(&self, doc: &Document, node: NodeId, element: &mut XmlElement)
        -> Result<()>;

    fn marshall_content(&self, doc: &Document, node: NodeId, element: &mut XmlElement)
        -> Result<()>;
}

/// Receives a node's attributes, children and text while unmarshalling.
pub trait ObjectUnmarshaller: Send + Sync {
    fn process_attribute(&self, doc: &mut Document, node: NodeId, attr: &XmlAttribute)
        -> Result<()>;

    /// Attach an already unmarshalled child, or reject it with
    /// [`Error::UnknownElement`].
    fn process_child(&self, doc: &mut Document, parent: NodeId, child: NodeId) -> Result<()>;

    fn process_text(&self, doc: &mut Document, node: NodeId, text: &str) -> Result<()>;
}

/// One structural constraint on one node. Must not mutate anything.
pub trait Validator: Send + Sync {
    fn validate(&self, doc: &Document, node: NodeId) -> std::result::Result<(), ValidationError>;
}

#[derive(Clone)]
pub struct RegistryEntry {
    pub builder: Arc<dyn ObjectBuilder>,
    pub marshaller: Arc<dyn ObjectMarshaller>,
    pub unmarshaller: Arc<dyn ObjectUnmarshaller>,
    pub validators: Vec<Arc<dyn Validator>>,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    entries: HashMap<QName, RegistryEntry>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: QName,
        builder: Arc<dyn ObjectBuilder>,
        marshaller: Arc<dyn ObjectMarshaller>,
        unmarshaller: Arc<dyn ObjectUnmarshaller>,
        validators: Vec<Arc<dyn Validator>>,
    ) -> Result<&mut Self> {
        if self.entries.contains_key(&name) {
            return Err(Error::DuplicateRegistration(name));
        }
        self.entries.insert(
            name,
            RegistryEntry {
                builder,
                marshaller,
                unmarshaller,
                validators,
            },
        );
        Ok(self)
    }

    /// Register a type described by a declarative binding. The binding's
    /// own constraint validators are added automatically.
    pub fn register_binding(&mut self, binding: &'static ElementBinding) -> Result<&mut Self> {
        let handler = Arc::new(BindingHandler::new(binding));
        self.register(
            binding.name(),
            handler.clone(),
            handler.clone(),
            handler,
            binding.constraint_validators(),
        )
    }

    /// Add a validator to an already registered type.
    pub fn add_validator(&mut self, name: &QName, validator: Arc<dyn Validator>) -> Result<&mut Self> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| Error::UnknownType(name.clone()))?;
        entry.validators.push(validator);
        Ok(self)
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn build(self) -> TypeRegistry {
        tracing::debug!(types = self.entries.len(), "type registry frozen");
        TypeRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable lookup table shared by the engines.
#[derive(Debug)]
pub struct TypeRegistry {
    entries: HashMap<QName, RegistryEntry>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    pub fn lookup(&self, name: &QName) -> Result<&RegistryEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::UnknownType(name.clone()))
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create an empty node of the registered type.
    pub fn build(&self, doc: &mut Document, name: &QName) -> Result<NodeId> {
        Ok(self.lookup(name)?.builder.build(doc, name))
    }

    pub fn build_kind(&self, doc: &mut Document, kind: ElementKind) -> Result<NodeId> {
        self.build(doc, &kind.qname())
    }
}
