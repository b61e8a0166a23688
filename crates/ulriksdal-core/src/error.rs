#![forbid(unsafe_code)]

use std::fmt;

use crate::QName;

/// Errors produced by the Ulriksdal libraries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("XML writing error: {0}")]
    XmlWrite(String),

    #[error("no type registered for {0}")]
    UnknownType(QName),

    #[error("type already registered for {0}")]
    DuplicateRegistration(QName),

    #[error("unknown element {element} under {parent}")]
    UnknownElement { parent: QName, element: QName },

    #[error("unknown attribute {attribute} on {element}")]
    UnknownAttribute { element: QName, attribute: QName },

    #[error("unexpected content in {element}: {detail}")]
    UnexpectedContent { element: QName, detail: String },

    #[error("invalid value {value:?} for attribute {attribute} on {element}: {reason}")]
    InvalidAttributeValue {
        element: QName,
        attribute: QName,
        value: String,
        reason: String,
    },

    #[error("unknown key usage: {0:?}")]
    UnknownUsage(String),

    #[error("cannot marshal {element}: {reason}")]
    Marshalling { element: QName, reason: String },

    #[error("cannot unmarshal {element}: {source}")]
    Unmarshalling {
        element: QName,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("duplicate ID value: {0}")]
    DuplicateId(String),

    #[error("invalid tree operation: {0}")]
    Tree(String),

    #[error("element is not signed: {0}")]
    Unsigned(String),

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("digest mismatch for reference: {0}")]
    DigestMismatch(String),

    #[error("credential resolution failed ({kind}): {message}")]
    Resolution {
        kind: ResolutionErrorKind,
        message: String,
    },

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error raised while unmarshalling `element`.
    ///
    /// Nested wrappers collapse so the outermost element names the document
    /// root and the source is the first violation encountered.
    #[must_use]
    pub fn unmarshalling(element: QName, source: Error) -> Self {
        let source = match source {
            Error::Unmarshalling { source, .. } => source,
            other => Box::new(other),
        };
        Error::Unmarshalling { element, source }
    }

    #[must_use]
    pub fn marshalling(element: QName, reason: impl Into<String>) -> Self {
        Error::Marshalling {
            element,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn detached(message: impl Into<String>) -> Self {
        Error::Resolution {
            kind: ResolutionErrorKind::DetachedNode,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unexpected_ancestor(message: impl Into<String>) -> Self {
        Error::Resolution {
            kind: ResolutionErrorKind::UnexpectedAncestor,
            message: message.into(),
        }
    }

    /// The innermost cause of an unmarshalling failure, or `self`.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Unmarshalling { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Validation failures carried by this error, if any.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            Error::Validation(errors) => Some(errors.as_slice()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Credential resolution ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    /// The key-bearing node has no parent.
    DetachedNode,
    /// An ancestor is not of the kind the metadata schema requires.
    UnexpectedAncestor,
}

impl fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetachedNode => f.write_str("detached node"),
            Self::UnexpectedAncestor => f.write_str("unexpected ancestor"),
        }
    }
}

// ── Schema validation ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingRequiredChild,
    MissingRequiredAttribute,
    Cardinality,
    MutuallyExclusive,
    InvalidValue,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingRequiredChild => "missing required child",
            Self::MissingRequiredAttribute => "missing required attribute",
            Self::Cardinality => "cardinality violated",
            Self::MutuallyExclusive => "mutually exclusive content",
            Self::InvalidValue => "invalid value",
        };
        f.write_str(s)
    }
}

/// One schema constraint violation on one element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{element}: {kind}: {message}")]
pub struct ValidationError {
    pub element: QName,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(element: QName, kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            element,
            kind,
            message: message.into(),
        }
    }
}

/// The violations reported by one validation run; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Returns `None` when `errors` is empty.
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn first(&self) -> &ValidationError {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err.into())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema validation failed: ")?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmarshalling_collapses_nested_wrappers() {
        let leaf = QName::new("urn:x", "Leaf");
        let root = QName::new("urn:x", "Root");
        let inner = Error::UnknownAttribute {
            element: leaf.clone(),
            attribute: QName::local("bogus"),
        };
        let err = Error::unmarshalling(root.clone(), Error::unmarshalling(leaf, inner));
        match &err {
            Error::Unmarshalling { element, source } => {
                assert_eq!(element, &root);
                assert!(matches!(**source, Error::UnknownAttribute { .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(err.root_cause(), Error::UnknownAttribute { .. }));
    }

    #[test]
    fn test_validation_errors_never_empty() {
        assert!(ValidationErrors::from_vec(Vec::new()).is_none());
        let err = ValidationError::new(
            QName::new("urn:x", "Root"),
            ValidationErrorKind::MissingRequiredChild,
            "Leaf is required",
        );
        let errors = ValidationErrors::from_vec(vec![err.clone()]).unwrap();
        assert_eq!(errors.first(), &err);
        assert!(errors.to_string().contains("missing required child"));
    }

    #[test]
    fn test_resolution_helpers() {
        let err = Error::detached("KeyInfo has no parent");
        assert!(matches!(
            err,
            Error::Resolution { kind: ResolutionErrorKind::DetachedNode, .. }
        ));
    }
}
