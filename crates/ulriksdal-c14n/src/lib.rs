#![forbid(unsafe_code)]

//! XML Canonicalization for the Ulriksdal signature subsystem.
//!
//! Only Exclusive Canonical XML 1.0 is provided, with and without comments.
//! It is the form protocol signatures use, since it keeps a signed element's
//! canonical bytes independent of the document it is embedded in.

pub mod exclusive;
pub mod render;

use ulriksdal_core::{algorithm, Error};
use ulriksdal_xml::{Namespace, XmlElement};

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveWithComments)
    }
}

/// Canonicalize an element subtree.
///
/// - `inherited`: bindings in scope at `element` from ancestors outside the subtree
/// - `inclusive_prefixes`: the InclusiveNamespaces PrefixList
pub fn canonicalize(
    element: &XmlElement,
    mode: C14nMode,
    inherited: &[Namespace],
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    exclusive::canonicalize(element, inherited, mode.with_comments(), inclusive_prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulriksdal_xml::parse;

    fn exc(xml: &str) -> String {
        let root = parse(xml).unwrap();
        String::from_utf8(canonicalize(&root, C14nMode::Exclusive, &[], &[]).unwrap()).unwrap()
    }

    #[test]
    fn test_unused_namespaces_dropped() {
        let out = exc(r#"<a:Root xmlns:a="urn:a" xmlns:b="urn:b"><a:Leaf/></a:Root>"#);
        assert_eq!(out, r#"<a:Root xmlns:a="urn:a"><a:Leaf></a:Leaf></a:Root>"#);
    }

    #[test]
    fn test_namespace_pushed_down_to_user() {
        let out = exc(r#"<a:Root xmlns:a="urn:a" xmlns:b="urn:b"><b:Leaf/></a:Root>"#);
        assert_eq!(
            out,
            r#"<a:Root xmlns:a="urn:a"><b:Leaf xmlns:b="urn:b"></b:Leaf></a:Root>"#
        );
    }

    #[test]
    fn test_attribute_order_and_escaping() {
        let out = exc(r#"<r xmlns:p="urn:p" z="1" p:y="2" a="x&amp;&quot;y">t&gt;</r>"#);
        assert_eq!(
            out,
            r#"<r xmlns:p="urn:p" a="x&amp;&quot;y" z="1" p:y="2">t&gt;</r>"#
        );
    }

    #[test]
    fn test_default_namespace_undeclared() {
        let out = exc(r#"<r xmlns="urn:r"><c xmlns=""/></r>"#);
        assert_eq!(out, r#"<r xmlns="urn:r"><c xmlns=""></c></r>"#);
    }

    #[test]
    fn test_subtree_uses_inherited_bindings() {
        let root = parse(r#"<a:Root xmlns:a="urn:a"><a:Leaf ID="x"/></a:Root>"#).unwrap();
        let leaf = root.child_elements().next().unwrap();
        let inherited = vec![Namespace::new("a", "urn:a")];
        let out = canonicalize(leaf, C14nMode::Exclusive, &inherited, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a:Leaf xmlns:a="urn:a" ID="x"></a:Leaf>"#
        );
    }

    #[test]
    fn test_inclusive_prefix_list() {
        let root = parse(r#"<a:Root xmlns:a="urn:a" xmlns:b="urn:b"/>"#).unwrap();
        let out = canonicalize(&root, C14nMode::Exclusive, &[], &["b".to_owned()]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a:Root xmlns:a="urn:a" xmlns:b="urn:b"></a:Root>"#
        );
    }

    #[test]
    fn test_nesting_limit() {
        let mut element = XmlElement::new(ulriksdal_core::QName::local("e"));
        for _ in 0..ulriksdal_xml::MAX_DEPTH {
            element = XmlElement::new(ulriksdal_core::QName::local("e")).with_child(element);
        }
        assert!(matches!(
            canonicalize(&element, C14nMode::Exclusive, &[], &[]),
            Err(Error::Canonicalization(_))
        ));
        let inner = element.child_elements().next().unwrap();
        assert!(canonicalize(inner, C14nMode::Exclusive, &[], &[]).is_ok());
    }

    #[test]
    fn test_comments_only_with_comments_mode() {
        let root = parse("<r><!--c-->x</r>").unwrap();
        let plain = canonicalize(&root, C14nMode::Exclusive, &[], &[]).unwrap();
        assert_eq!(plain, b"<r>x</r>");
        let with = canonicalize(&root, C14nMode::ExclusiveWithComments, &[], &[]).unwrap();
        assert_eq!(with, b"<r><!--c-->x</r>");
    }
}
