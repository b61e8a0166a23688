#![forbid(unsafe_code)]

//! Schema validator chain.
//!
//! [`ValidatorSuite`] runs the validators the registry holds for a node's
//! qualified name. Validators read only the node and its direct children.

use crate::binding::UNBOUNDED;
use crate::document::{Document, NodeId};
use crate::kind::ElementKind;
use crate::registry::{TypeRegistry, Validator};
use ulriksdal_core::{Error, Result, ValidationError, ValidationErrorKind, ValidationErrors};

/// Whether validation stops at the first violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    FailFast,
    CollectAll,
}

#[derive(Debug, Clone, Copy)]
pub struct ValidatorSuite<'r> {
    registry: &'r TypeRegistry,
    mode: ValidationMode,
}

impl<'r> ValidatorSuite<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            mode: ValidationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validate one node.
    pub fn validate(&self, doc: &Document, node: NodeId) -> Result<()> {
        let mut errors = Vec::new();
        self.collect(doc, node, &mut errors)?;
        into_result(errors)
    }

    /// Validate a node and every descendant, in document order.
    pub fn validate_tree(&self, doc: &Document, node: NodeId) -> Result<()> {
        let mut errors = Vec::new();
        for current in doc.descendants(node) {
            self.collect(doc, current, &mut errors)?;
            if self.mode == ValidationMode::FailFast && !errors.is_empty() {
                break;
            }
        }
        into_result(errors)
    }

    fn collect(&self, doc: &Document, node: NodeId, errors: &mut Vec<ValidationError>) -> Result<()> {
        let name = doc.node(node)?.name();
        let entry = self.registry.lookup(name)?;
        tracing::trace!(element = %name, validators = entry.validators.len(), "validating");
        for validator in &entry.validators {
            if let Err(err) = validator.validate(doc, node) {
                errors.push(err);
                if self.mode == ValidationMode::FailFast {
                    break;
                }
            }
        }
        Ok(())
    }
}

fn into_result(errors: Vec<ValidationError>) -> Result<()> {
    match ValidationErrors::from_vec(errors) {
        Some(errors) => Err(Error::Validation(errors)),
        None => Ok(()),
    }
}

// ── Generic validators ──────────────────────────────────────────────

fn violation(doc: &Document, node: NodeId, kind: ValidationErrorKind, message: String) -> ValidationError {
    let element = doc
        .get(node)
        .map(|n| n.name().clone())
        .unwrap_or_else(|| ulriksdal_core::QName::local("?"));
    ValidationError::new(element, kind, message)
}

#[derive(Debug, Clone, Copy)]
pub struct RequiredAttribute {
    namespace: &'static str,
    local_name: &'static str,
}

impl RequiredAttribute {
    pub fn new(namespace: &'static str, local_name: &'static str) -> Self {
        Self {
            namespace,
            local_name,
        }
    }
}

impl Validator for RequiredAttribute {
    fn validate(&self, doc: &Document, node: NodeId) -> std::result::Result<(), ValidationError> {
        let present = doc
            .get(node)
            .and_then(|n| n.attribute(self.namespace, self.local_name))
            .is_some_and(|v| !v.trim().is_empty());
        if present {
            return Ok(());
        }
        Err(violation(
            doc,
            node,
            ValidationErrorKind::MissingRequiredAttribute,
            format!("attribute {} is required", self.local_name),
        ))
    }
}

/// Bounds on the number of children of one kind.
#[derive(Debug, Clone, Copy)]
pub struct ChildCardinality {
    kind: ElementKind,
    min: u32,
    max: u32,
}

impl ChildCardinality {
    pub fn new(kind: ElementKind, min: u32, max: u32) -> Self {
        Self { kind, min, max }
    }
}

impl Validator for ChildCardinality {
    fn validate(&self, doc: &Document, node: NodeId) -> std::result::Result<(), ValidationError> {
        let count = doc.children_of_kind(node, self.kind).count();
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        if count == 0 && self.min > 0 {
            return Err(violation(
                doc,
                node,
                ValidationErrorKind::MissingRequiredChild,
                format!("{} is required", self.kind),
            ));
        }
        if count < self.min || count > self.max {
            let bound = if self.max == UNBOUNDED {
                format!("at least {}", self.min)
            } else if self.min == self.max {
                format!("exactly {}", self.min)
            } else {
                format!("between {} and {}", self.min, self.max)
            };
            return Err(violation(
                doc,
                node,
                ValidationErrorKind::Cardinality,
                format!("expected {bound} {}, found {count}", self.kind),
            ));
        }
        Ok(())
    }
}

/// Text content must be present and not blank.
#[derive(Debug, Clone, Copy)]
pub struct RequiredText;

impl Validator for RequiredText {
    fn validate(&self, doc: &Document, node: NodeId) -> std::result::Result<(), ValidationError> {
        let present = doc
            .get(node)
            .and_then(|n| n.text())
            .is_some_and(|t| !t.trim().is_empty());
        if present {
            return Ok(());
        }
        Err(violation(
            doc,
            node,
            ValidationErrorKind::InvalidValue,
            "element content must not be empty".to_owned(),
        ))
    }
}

/// At least one child of the listed kinds must be present.
#[derive(Debug, Clone, Copy)]
pub struct RequireOneOf(pub &'static [ElementKind]);

impl Validator for RequireOneOf {
    fn validate(&self, doc: &Document, node: NodeId) -> std::result::Result<(), ValidationError> {
        if self
            .0
            .iter()
            .any(|k| doc.first_child_of_kind(node, *k).is_some())
        {
            return Ok(());
        }
        let names: Vec<&str> = self.0.iter().map(|k| k.local_name()).collect();
        Err(violation(
            doc,
            node,
            ValidationErrorKind::MissingRequiredChild,
            format!("one of {} is required", names.join(", ")),
        ))
    }
}

/// Children of two kinds must not both be present.
#[derive(Debug, Clone, Copy)]
pub struct MutuallyExclusive(pub ElementKind, pub ElementKind);

impl Validator for MutuallyExclusive {
    fn validate(&self, doc: &Document, node: NodeId) -> std::result::Result<(), ValidationError> {
        let both = doc.first_child_of_kind(node, self.0).is_some()
            && doc.first_child_of_kind(node, self.1).is_some();
        if !both {
            return Ok(());
        }
        Err(violation(
            doc,
            node,
            ValidationErrorKind::MutuallyExclusive,
            format!("{} and {} cannot both be present", self.0, self.1),
        ))
    }
}
