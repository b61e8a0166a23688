#![forbid(unsafe_code)]

//! Signature state carried by signable nodes.
//!
//! A node asks for a signature with [`SignatureContext::pending`]; the
//! marshaller hands the node's marshalled element to a [`ContentSigner`] and
//! records the resulting [`SignedSignature`]. Parsed documents produce the
//! signed state directly. Nothing here records whether a signature verified.

use ulriksdal_core::{algorithm, ns, Error, Result};
use ulriksdal_keys::keyinfo::decode_base64;
use ulriksdal_xml::{Namespace, XmlElement};

/// Algorithms and options for producing a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParams {
    /// Signature algorithm URI; `None` picks the key's default.
    pub signature_method: Option<String>,
    pub digest_method: String,
    pub canonicalization: String,
    /// InclusiveNamespaces PrefixList for both canonicalization steps.
    pub inclusive_prefixes: Vec<String>,
    /// Emit `ds:KeyInfo` describing the signing key.
    pub include_key_info: bool,
}

impl Default for SignatureParams {
    fn default() -> Self {
        Self {
            signature_method: None,
            digest_method: algorithm::SHA256.to_owned(),
            canonicalization: algorithm::EXC_C14N.to_owned(),
            inclusive_prefixes: Vec::new(),
            include_key_info: true,
        }
    }
}

impl SignatureParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signature_method(mut self, uri: impl Into<String>) -> Self {
        self.signature_method = Some(uri.into());
        self
    }

    pub fn with_digest_method(mut self, uri: impl Into<String>) -> Self {
        self.digest_method = uri.into();
        self
    }

    pub fn with_canonicalization(mut self, uri: impl Into<String>) -> Self {
        self.canonicalization = uri.into();
        self
    }

    pub fn with_inclusive_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.inclusive_prefixes = prefixes;
        self
    }

    pub fn with_key_info(mut self, include: bool) -> Self {
        self.include_key_info = include;
        self
    }
}

/// Produces the `ds:Signature` for a marshalled element.
pub trait ContentSigner {
    /// Sign `element`, whose ID is `reference_id`.
    ///
    /// `inherited` lists the namespace bindings in scope at `element` from
    /// its ancestors. The element does not yet contain the signature.
    fn sign(
        &self,
        reference_id: &str,
        element: &XmlElement,
        inherited: &[Namespace],
        params: &SignatureParams,
    ) -> Result<SignedSignature>;
}

#[derive(Debug, Clone)]
pub enum SignatureState {
    /// Signing was requested and happens at the next marshal.
    Pending(SignatureParams),
    /// The digest and signature value are fixed.
    Signed(SignedSignature),
}

/// Where a signature is marshalled among its element's children.
///
/// Computed signatures go first. A parsed signature keeps the position and
/// indentation it had, since the enveloped transform leaves the whitespace
/// around it in the signed content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// Number of child nodes written before the signature.
    pub index: usize,
    pub leading_whitespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SignatureContext {
    state: SignatureState,
    placement: Placement,
}

impl SignatureContext {
    pub fn pending(params: SignatureParams) -> Self {
        Self {
            state: SignatureState::Pending(params),
            placement: Placement::default(),
        }
    }

    pub fn signed(signature: SignedSignature) -> Self {
        Self {
            state: SignatureState::Signed(signature),
            placement: Placement::default(),
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn state(&self) -> &SignatureState {
        &self.state
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SignatureState::Pending(_))
    }

    pub fn signed_signature(&self) -> Option<&SignedSignature> {
        match &self.state {
            SignatureState::Signed(s) => Some(s),
            SignatureState::Pending(_) => None,
        }
    }
}

// ── Signed signature ─────────────────────────────────────────────────

/// A complete `ds:Signature` with one same-document reference.
#[derive(Debug, Clone)]
pub struct SignedSignature {
    reference_uri: String,
    transforms: Vec<String>,
    reference_prefixes: Vec<String>,
    digest_method: String,
    digest_value: Vec<u8>,
    signature_method: String,
    canonicalization: String,
    signed_info_prefixes: Vec<String>,
    signature_value: Vec<u8>,
    element: XmlElement,
}

impl SignedSignature {
    /// Read a `ds:Signature` element.
    ///
    /// The element should carry every namespace binding it relies on, since
    /// SignedInfo is later canonicalized on its own.
    pub fn from_element(element: XmlElement) -> Result<Self> {
        if !element.name.is(ns::DSIG, ns::node::SIGNATURE) {
            return Err(Error::MissingElement(format!(
                "expected ds:Signature, found {}",
                element.name
            )));
        }
        let signed_info = dsig_child(&element, ns::node::SIGNED_INFO)?;

        let c14n = dsig_child(signed_info, ns::node::CANONICALIZATION_METHOD)?;
        let canonicalization = algorithm_of(c14n)?;
        let signed_info_prefixes = prefix_list(c14n);

        let signature_method = algorithm_of(dsig_child(signed_info, ns::node::SIGNATURE_METHOD)?)?;

        let reference = {
            let mut references = signed_info.find_children(ns::DSIG, ns::node::REFERENCE);
            match (references.next(), references.next()) {
                (None, _) => return Err(Error::MissingElement("ds:Reference".into())),
                (Some(reference), None) => reference,
                (Some(_), Some(_)) => {
                    return Err(Error::Other(
                        "signatures with more than one ds:Reference are not supported".into(),
                    ))
                }
            }
        };
        let reference_uri = reference
            .attr(ns::attr::URI)
            .ok_or_else(|| Error::MissingAttribute("ds:Reference/@URI".into()))?
            .to_owned();

        let mut transforms = Vec::new();
        let mut reference_prefixes = Vec::new();
        if let Some(list) = reference.find_child(ns::DSIG, ns::node::TRANSFORMS) {
            for transform in list.find_children(ns::DSIG, ns::node::TRANSFORM) {
                let uri = algorithm_of(transform)?;
                if uri == algorithm::EXC_C14N || uri == algorithm::EXC_C14N_WITH_COMMENTS {
                    reference_prefixes = prefix_list(transform);
                }
                transforms.push(uri);
            }
        }

        let digest_method = algorithm_of(dsig_child(reference, ns::node::DIGEST_METHOD)?)?;
        let digest_value = decode_base64(&dsig_child(reference, ns::node::DIGEST_VALUE)?.text())
            .map_err(|e| Error::Base64(format!("DigestValue: {e}")))?;
        let signature_value =
            decode_base64(&dsig_child(&element, ns::node::SIGNATURE_VALUE)?.text())
                .map_err(|e| Error::Base64(format!("SignatureValue: {e}")))?;

        Ok(Self {
            reference_uri,
            transforms,
            reference_prefixes,
            digest_method,
            digest_value,
            signature_method,
            canonicalization,
            signed_info_prefixes,
            signature_value,
            element,
        })
    }

    pub fn reference_uri(&self) -> &str {
        &self.reference_uri
    }

    pub fn transforms(&self) -> &[String] {
        &self.transforms
    }

    /// PrefixList of the reference's exclusive canonicalization transform.
    pub fn reference_prefixes(&self) -> &[String] {
        &self.reference_prefixes
    }

    pub fn digest_method(&self) -> &str {
        &self.digest_method
    }

    pub fn digest_value(&self) -> &[u8] {
        &self.digest_value
    }

    pub fn signature_method(&self) -> &str {
        &self.signature_method
    }

    pub fn canonicalization(&self) -> &str {
        &self.canonicalization
    }

    pub fn signed_info_prefixes(&self) -> &[String] {
        &self.signed_info_prefixes
    }

    pub fn signature_value(&self) -> &[u8] {
        &self.signature_value
    }

    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    pub fn signed_info(&self) -> Result<&XmlElement> {
        dsig_child(&self.element, ns::node::SIGNED_INFO)
    }

    pub fn key_info(&self) -> Option<&XmlElement> {
        self.element.find_child(ns::DSIG, ns::node::KEY_INFO)
    }

    /// Base64 text of every `ds:X509Certificate` in the signature's KeyInfo.
    pub fn certificates(&self) -> Vec<String> {
        let Some(key_info) = self.key_info() else {
            return Vec::new();
        };
        key_info
            .find_children(ns::DSIG, ns::node::X509_DATA)
            .flat_map(|data| data.find_children(ns::DSIG, ns::node::X509_CERTIFICATE))
            .map(XmlElement::text)
            .collect()
    }
}

fn dsig_child<'a>(parent: &'a XmlElement, local_name: &str) -> Result<&'a XmlElement> {
    parent
        .find_child(ns::DSIG, local_name)
        .ok_or_else(|| Error::MissingElement(format!("ds:{local_name}")))
}

fn algorithm_of(element: &XmlElement) -> Result<String> {
    element
        .attr(ns::attr::ALGORITHM)
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::MissingAttribute(format!("{}/@Algorithm", element.name.local_name()))
        })
}

fn prefix_list(element: &XmlElement) -> Vec<String> {
    element
        .find_child(ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES)
        .and_then(|e| e.attr(ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}
