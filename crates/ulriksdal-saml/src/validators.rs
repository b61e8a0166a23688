#![forbid(unsafe_code)]

//! Schema constraints the declarative bindings cannot express.

use crate::binding::parse_date_time;
use crate::document::{Document, NodeId};
use crate::kind::ElementKind;
use crate::registry::Validator;
use crate::validation::{MutuallyExclusive, RequireOneOf};
use ulriksdal_core::{ns, QName, ValidationError, ValidationErrorKind};

type Outcome = Result<(), ValidationError>;

fn invalid(doc: &Document, node: NodeId, message: impl Into<String>) -> ValidationError {
    let element = doc
        .get(node)
        .map(|n| n.name().clone())
        .unwrap_or_else(|| QName::local("?"));
    ValidationError::new(element, ValidationErrorKind::InvalidValue, message)
}

pub const ENTITY_HAS_ROLE: RequireOneOf = RequireOneOf(&[
    ElementKind::IdpSsoDescriptor,
    ElementKind::SpSsoDescriptor,
    ElementKind::AttributeAuthorityDescriptor,
]);

pub const ENTITIES_NOT_EMPTY: RequireOneOf =
    RequireOneOf(&[ElementKind::EntitiesDescriptor, ElementKind::EntityDescriptor]);

pub const SUBJECT_IDENTIFIED: RequireOneOf =
    RequireOneOf(&[ElementKind::NameId, ElementKind::SubjectConfirmation]);

pub const SAML1_SUBJECT_IDENTIFIED: RequireOneOf = RequireOneOf(&[
    ElementKind::Saml1NameIdentifier,
    ElementKind::Saml1SubjectConfirmation,
]);

pub const AUTHN_CONTEXT_REQUESTED: RequireOneOf = RequireOneOf(&[
    ElementKind::AuthnContextClassRef,
    ElementKind::AuthnContextDeclRef,
]);

/// A request names class references or declaration references, not both.
pub const AUTHN_CONTEXT_CHOICE: MutuallyExclusive = MutuallyExclusive(
    ElementKind::AuthnContextClassRef,
    ElementKind::AuthnContextDeclRef,
);

/// `protocolSupportEnumeration` lists at least one absolute URI.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolSupport;

impl Validator for ProtocolSupport {
    fn validate(&self, doc: &Document, node: NodeId) -> Outcome {
        let Some(value) = doc
            .get(node)
            .and_then(|n| n.attr(ns::attr::PROTOCOL_SUPPORT_ENUMERATION))
        else {
            // reported by the required-attribute check
            return Ok(());
        };
        let mut protocols = value.split_whitespace().peekable();
        if protocols.peek().is_none() {
            return Err(invalid(doc, node, "protocolSupportEnumeration is empty"));
        }
        if let Some(bad) = protocols.find(|p| !p.contains(':')) {
            return Err(invalid(
                doc,
                node,
                format!("protocolSupportEnumeration entry {bad:?} is not an absolute URI"),
            ));
        }
        Ok(())
    }
}

/// SAML 2.0 messages carry `Version="2.0"`.
#[derive(Debug, Clone, Copy)]
pub struct SamlVersion;

impl Validator for SamlVersion {
    fn validate(&self, doc: &Document, node: NodeId) -> Outcome {
        match doc.get(node).and_then(|n| n.attr(ns::attr::VERSION)) {
            None | Some("2.0") => Ok(()),
            Some(other) => Err(invalid(doc, node, format!("unsupported Version {other:?}"))),
        }
    }
}

/// `NotBefore` precedes `NotOnOrAfter` when both are given.
#[derive(Debug, Clone, Copy)]
pub struct ValidityWindow;

impl Validator for ValidityWindow {
    fn validate(&self, doc: &Document, node: NodeId) -> Outcome {
        let Some(n) = doc.get(node) else {
            return Ok(());
        };
        let bounds = n
            .attr(ns::attr::NOT_BEFORE)
            .and_then(parse_date_time)
            .zip(n.attr(ns::attr::NOT_ON_OR_AFTER).and_then(parse_date_time));
        match bounds {
            Some((start, end)) if start >= end => Err(invalid(
                doc,
                node,
                "NotBefore must be earlier than NotOnOrAfter",
            )),
            _ => Ok(()),
        }
    }
}

/// The outermost SAML 2.0 status code is one of the four top-level codes.
#[derive(Debug, Clone, Copy)]
pub struct TopLevelStatusCode;

const TOP_LEVEL_CODES: [&str; 4] = [
    ns::status::SUCCESS,
    ns::status::REQUESTER,
    ns::status::RESPONDER,
    ns::status::VERSION_MISMATCH,
];

impl Validator for TopLevelStatusCode {
    fn validate(&self, doc: &Document, node: NodeId) -> Outcome {
        let value = doc
            .first_child_of_kind(node, ElementKind::StatusCode)
            .and_then(|code| doc.get(code))
            .and_then(|code| code.attr(ns::attr::VALUE));
        match value {
            Some(v) if !TOP_LEVEL_CODES.contains(&v) => Err(invalid(
                doc,
                node,
                format!("{v:?} is not a top-level status code"),
            )),
            _ => Ok(()),
        }
    }
}
