#![forbid(unsafe_code)]

//! Declarative element bindings.
//!
//! Most protocol types are plain data: a fixed attribute set, an ordered
//! list of child types and optionally text. An [`ElementBinding`] describes
//! that shape once; [`BindingHandler`] turns it into the builder, marshaller
//! and unmarshaller the registry needs, and the binding contributes its own
//! constraint validators.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::document::{Capabilities, Document, NodeId};
use crate::kind::ElementKind;
use crate::registry::{ObjectBuilder, ObjectMarshaller, ObjectUnmarshaller, Validator};
use crate::validation::{ChildCardinality, RequiredAttribute, RequiredText};
use ulriksdal_core::{ns, Error, QName, Result};
use ulriksdal_xml::{XmlAttribute, XmlElement};

pub const UNBOUNDED: u32 = u32::MAX;

/// Lexical type of an attribute value, checked at unmarshal time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Boolean,
    UnsignedShort,
    Integer,
    /// `xs:dateTime` in RFC 3339 form.
    DateTime,
    AnyUri,
    /// The element's ID attribute.
    Id,
    Enumerated(&'static [&'static str]),
    /// `md:KeyDescriptor/@use`.
    KeyUse,
    /// Whitespace-separated list of protocol URIs.
    ProtocolList,
}

impl ValueType {
    /// Check `value` against this type.
    pub fn check(&self, element: &QName, attribute: &QName, value: &str) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidAttributeValue {
            element: element.clone(),
            attribute: attribute.clone(),
            value: value.to_owned(),
            reason: reason.to_owned(),
        };
        match self {
            ValueType::String | ValueType::ProtocolList => Ok(()),
            ValueType::Boolean => match value.trim() {
                "true" | "false" | "1" | "0" => Ok(()),
                _ => Err(invalid("expected a boolean")),
            },
            ValueType::UnsignedShort => value
                .trim()
                .parse::<u16>()
                .map(drop)
                .map_err(|_| invalid("expected an unsigned short")),
            ValueType::Integer => value
                .trim()
                .parse::<i64>()
                .map(drop)
                .map_err(|_| invalid("expected an integer")),
            ValueType::DateTime => DateTime::parse_from_rfc3339(value.trim())
                .map(drop)
                .map_err(|e| invalid(&format!("expected an RFC 3339 timestamp: {e}"))),
            ValueType::AnyUri => {
                if value.trim().chars().any(char::is_whitespace) {
                    Err(invalid("URI contains whitespace"))
                } else {
                    Ok(())
                }
            }
            ValueType::Id => {
                if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == ':') {
                    Err(invalid("not a valid ID"))
                } else {
                    Ok(())
                }
            }
            ValueType::Enumerated(allowed) => {
                if allowed.iter().any(|a| *a == value) {
                    Ok(())
                } else {
                    Err(invalid(&format!("expected one of {}", allowed.join(", "))))
                }
            }
            ValueType::KeyUse => match value {
                "signing" | "encryption" => Ok(()),
                other => Err(Error::UnknownUsage(other.to_owned())),
            },
        }
    }
}

/// Parse an `xs:boolean` attribute value.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parse an `xs:dateTime` attribute value.
pub fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub namespace: &'static str,
    pub local_name: &'static str,
    pub value: ValueType,
    pub required: bool,
}

impl AttributeSpec {
    pub const fn optional(local_name: &'static str, value: ValueType) -> Self {
        Self {
            namespace: "",
            local_name,
            value,
            required: false,
        }
    }

    pub const fn required(local_name: &'static str, value: ValueType) -> Self {
        Self {
            namespace: "",
            local_name,
            value,
            required: true,
        }
    }

    /// `xml:lang`.
    pub const fn xml_lang(required: bool) -> Self {
        Self {
            namespace: ns::XML,
            local_name: "lang",
            value: ValueType::String,
            required,
        }
    }

    pub fn matches(&self, name: &QName) -> bool {
        name.is(self.namespace, self.local_name)
    }

    pub fn qname(&self) -> QName {
        if self.namespace == ns::XML {
            QName::from_static(ns::XML, self.local_name, Some(ns::prefix::XML))
        } else {
            QName::from_static(self.namespace, self.local_name, None)
        }
    }
}

/// Allowed occurrences of one child type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSpec {
    pub kind: ElementKind,
    pub min: u32,
    pub max: u32,
}

impl ChildSpec {
    pub const fn one(kind: ElementKind) -> Self {
        Self { kind, min: 1, max: 1 }
    }

    pub const fn optional(kind: ElementKind) -> Self {
        Self { kind, min: 0, max: 1 }
    }

    pub const fn many(kind: ElementKind) -> Self {
        Self {
            kind,
            min: 0,
            max: UNBOUNDED,
        }
    }

    pub const fn at_least_one(kind: ElementKind) -> Self {
        Self {
            kind,
            min: 1,
            max: UNBOUNDED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content {
    /// Child elements only; non-whitespace text is unexpected.
    Elements,
    /// Text only.
    Text,
    /// Text, possibly mixed with elements.
    Mixed,
}

/// The shape of one element type.
#[derive(Debug, Clone, Copy)]
pub struct ElementBinding {
    pub kind: ElementKind,
    pub content: Content,
    pub attributes: &'static [AttributeSpec],
    pub children: &'static [ChildSpec],
    /// Accept attributes from foreign namespaces verbatim.
    pub any_attribute: bool,
    pub signable: bool,
    pub id_attribute: Option<&'static str>,
}

impl ElementBinding {
    const fn base(kind: ElementKind, content: Content) -> Self {
        Self {
            kind,
            content,
            attributes: &[],
            children: &[],
            any_attribute: false,
            signable: false,
            id_attribute: None,
        }
    }

    pub const fn elements(kind: ElementKind) -> Self {
        Self::base(kind, Content::Elements)
    }

    pub const fn text(kind: ElementKind) -> Self {
        Self::base(kind, Content::Text)
    }

    pub const fn mixed(kind: ElementKind) -> Self {
        Self::base(kind, Content::Mixed)
    }

    pub const fn with_id(mut self, attribute: &'static str) -> Self {
        self.id_attribute = Some(attribute);
        self
    }

    pub const fn signable(mut self, id_attribute: &'static str) -> Self {
        self.signable = true;
        self.id_attribute = Some(id_attribute);
        self
    }

    pub const fn any_attribute(mut self) -> Self {
        self.any_attribute = true;
        self
    }

    pub fn name(&self) -> QName {
        self.kind.qname()
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            attributes: !self.attributes.is_empty() || self.any_attribute,
            children: matches!(self.content, Content::Elements | Content::Mixed),
            text: matches!(self.content, Content::Text | Content::Mixed),
            signable: self.signable,
            id_attribute: self.id_attribute,
        }
    }

    pub fn attribute_spec(&self, name: &QName) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.matches(name))
    }

    pub fn child_spec(&self, name: &QName) -> Option<&ChildSpec> {
        self.children.iter().find(|c| c.kind.qname() == *name)
    }

    /// Validators enforcing required attributes, child cardinality and
    /// required text.
    pub fn constraint_validators(&self) -> Vec<Arc<dyn Validator>> {
        let mut out: Vec<Arc<dyn Validator>> = Vec::new();
        for attr in self.attributes.iter().filter(|a| a.required) {
            out.push(Arc::new(RequiredAttribute::new(attr.namespace, attr.local_name)));
        }
        for child in self.children {
            if child.min > 0 || child.max != UNBOUNDED {
                out.push(Arc::new(ChildCardinality::new(child.kind, child.min, child.max)));
            }
        }
        if self.content == Content::Text {
            out.push(Arc::new(RequiredText));
        }
        out
    }
}

/// Builder, marshaller and unmarshaller for a bound type.
#[derive(Debug, Clone, Copy)]
pub struct BindingHandler {
    binding: &'static ElementBinding,
}

impl BindingHandler {
    pub fn new(binding: &'static ElementBinding) -> Self {
        Self { binding }
    }
}

impl ObjectBuilder for BindingHandler {
    fn build(&self, doc: &mut Document, _name: &QName) -> NodeId {
        doc.create_node(self.binding.name(), self.binding.capabilities())
    }
}

impl ObjectMarshaller for BindingHandler {
    fn marshall_attributes(
        &self,
        doc: &Document,
        node: NodeId,
        element: &mut XmlElement,
    ) -> Result<()> {
        for (name, value) in doc.node(node)?.attributes() {
            element.set_attribute(name.clone(), value.as_str());
        }
        Ok(())
    }

    fn marshall_content(&self, doc: &Document, node: NodeId, element: &mut XmlElement) -> Result<()> {
        if let Some(text) = doc.node(node)?.text() {
            element.push_text(text);
        }
        Ok(())
    }
}

impl ObjectUnmarshaller for BindingHandler {
    fn process_attribute(&self, doc: &mut Document, node: NodeId, attr: &XmlAttribute) -> Result<()> {
        let binding = self.binding;
        if attr.name.namespace() == ns::XSI {
            return doc.set_attribute(node, attr.name.clone(), attr.value.as_str());
        }
        if let Some(spec) = binding.attribute_spec(&attr.name) {
            spec.value.check(&binding.name(), &attr.name, &attr.value)?;
            return doc.set_attribute(node, attr.name.clone(), attr.value.as_str());
        }
        let foreign =
            attr.name.has_namespace() && attr.name.namespace() != binding.kind.namespace();
        if binding.any_attribute && foreign {
            return doc.set_attribute(node, attr.name.clone(), attr.value.as_str());
        }
        Err(Error::UnknownAttribute {
            element: binding.name(),
            attribute: attr.name.clone(),
        })
    }

    fn process_child(&self, doc: &mut Document, parent: NodeId, child: NodeId) -> Result<()> {
        let name = doc.node(child)?.name().clone();
        if self.binding.child_spec(&name).is_none() {
            return Err(Error::UnknownElement {
                parent: self.binding.name(),
                element: name,
            });
        }
        doc.append_child(parent, child)
    }

    fn process_text(&self, doc: &mut Document, node: NodeId, text: &str) -> Result<()> {
        match self.binding.content {
            Content::Text | Content::Mixed => doc.set_text(node, Some(text.to_owned())),
            Content::Elements if text.trim().is_empty() => Ok(()),
            Content::Elements => Err(Error::UnexpectedContent {
                element: self.binding.name(),
                detail: format!("text {:?} in element-only content", text.trim()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(ty: ValueType, value: &str) -> Result<()> {
        ty.check(&QName::new("urn:x", "E"), &QName::local("a"), value)
    }

    #[test]
    fn test_value_types() {
        assert!(check(ValueType::Boolean, "true").is_ok());
        assert!(check(ValueType::Boolean, "yes").is_err());
        assert!(check(ValueType::UnsignedShort, "65535").is_ok());
        assert!(check(ValueType::UnsignedShort, "65536").is_err());
        assert!(check(ValueType::DateTime, "2024-05-01T12:00:00Z").is_ok());
        assert!(check(ValueType::DateTime, "yesterday").is_err());
        assert!(check(ValueType::Enumerated(&["Permit", "Deny"]), "Deny").is_ok());
        assert!(matches!(
            check(ValueType::Enumerated(&["Permit", "Deny"]), "Maybe"),
            Err(Error::InvalidAttributeValue { .. })
        ));
        assert!(check(ValueType::Id, "_abc").is_ok());
        assert!(check(ValueType::Id, "").is_err());
    }

    #[test]
    fn test_key_use() {
        assert!(check(ValueType::KeyUse, "signing").is_ok());
        assert!(check(ValueType::KeyUse, "encryption").is_ok());
        assert!(matches!(
            check(ValueType::KeyUse, "sign"),
            Err(Error::UnknownUsage(u)) if u == "sign"
        ));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_boolean(" 1 "), Some(true));
        assert_eq!(parse_boolean("false"), Some(false));
        assert!(parse_date_time("2024-05-01T12:00:00Z").is_some());
    }

    static SAMPLE: ElementBinding = ElementBinding {
        attributes: &[AttributeSpec::required("ID", ValueType::Id)],
        children: &[ChildSpec::one(ElementKind::Issuer)],
        ..ElementBinding::elements(ElementKind::Assertion).signable("ID")
    };

    #[test]
    fn test_capabilities_and_validators() {
        let caps = SAMPLE.capabilities();
        assert!(caps.attributes && caps.children && caps.signable && !caps.text);
        assert_eq!(caps.id_attribute, Some("ID"));
        assert_eq!(SAMPLE.constraint_validators().len(), 2);
    }
}
