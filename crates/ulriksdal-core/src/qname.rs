#![forbid(unsafe_code)]

//! Qualified XML names.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A namespace-qualified element or attribute name.
///
/// The preferred prefix is a serialization hint only: equality and hashing
/// consider the namespace URI and local name, so `saml:Assertion` and
/// `saml2:Assertion` in the same namespace are the same name.
#[derive(Debug, Clone)]
pub struct QName {
    namespace: Cow<'static, str>,
    local_name: Cow<'static, str>,
    prefix: Option<Cow<'static, str>>,
}

impl QName {
    /// Build a name from static parts. Used for the built-in type tables.
    pub const fn from_static(
        namespace: &'static str,
        local_name: &'static str,
        prefix: Option<&'static str>,
    ) -> Self {
        let prefix = match prefix {
            Some(p) => Some(Cow::Borrowed(p)),
            None => None,
        };
        Self {
            namespace: Cow::Borrowed(namespace),
            local_name: Cow::Borrowed(local_name),
            prefix,
        }
    }

    /// A namespaced name without a preferred prefix.
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Cow::Owned(namespace.into()),
            local_name: Cow::Owned(local_name.into()),
            prefix: None,
        }
    }

    /// A name in no namespace, as used by unqualified attributes.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self::new(String::new(), local_name)
    }

    /// Attach a preferred prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        self.prefix = if prefix.is_empty() {
            None
        } else {
            Some(Cow::Owned(prefix))
        };
        self
    }

    /// Namespace URI, empty when the name is unqualified.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }

    /// True when this name has the given namespace and local name.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace == namespace && self.local_name == local_name
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    /// Clark notation: `{namespace}local`, or the bare local name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefix_does_not_affect_identity() {
        let a = QName::new("urn:x", "Leaf").with_prefix("a");
        let b = QName::new("urn:x", "Leaf").with_prefix("b");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_namespace_distinguishes() {
        let a = QName::new("urn:x", "Leaf");
        let b = QName::new("urn:y", "Leaf");
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(QName::new("urn:x", "Leaf").to_string(), "{urn:x}Leaf");
        assert_eq!(QName::local("ID").to_string(), "ID");
    }

    #[test]
    fn test_static_and_owned_equal() {
        const ROOT: QName = QName::from_static("urn:x", "Root", Some("x"));
        assert_eq!(ROOT, QName::new("urn:x", "Root"));
        assert_eq!(ROOT.prefix(), Some("x"));
    }
}
