#![forbid(unsafe_code)]

//! Enveloped signature verification.
//!
//! Nothing about a successful check is cached on the node: every call
//! re-marshals the signed subtree in its ancestors' namespace scope and
//! recomputes both the reference digest and the
//! signature value check, so later edits are always seen.

use ulriksdal_c14n::C14nMode;
use ulriksdal_core::{algorithm, ns, Error, Result};
use ulriksdal_crypto::digest::constant_time_eq;
use ulriksdal_crypto::{DigestMethod, SignatureMethod};
use ulriksdal_keys::{Key, KeyUsage};
use ulriksdal_saml::{
    Credential, CredentialUsage, Document, Marshaller, NodeId, SignatureContext, SignedSignature,
    TypeRegistry,
};
use ulriksdal_xml::Namespace;

/// Verify the signature on `node` with `key`.
///
/// Fails with [`Error::Unsigned`] when the node carries no computed
/// signature, [`Error::DigestMismatch`] when the signed content changed,
/// and [`Error::SignatureInvalid`] when the signature value does not verify
/// under `key`.
pub fn verify(doc: &Document, registry: &TypeRegistry, node: NodeId, key: &Key) -> Result<()> {
    verify_any(doc, registry, node, &[key])
}

/// Verify with the key of a resolved metadata credential.
///
/// Credentials declared for encryption only are refused.
pub fn verify_with_credential(
    doc: &Document,
    registry: &TypeRegistry,
    node: NodeId,
    credential: &Credential,
) -> Result<()> {
    if credential.context.usage == CredentialUsage::Encryption {
        return Err(Error::Key("credential is declared for encryption only".into()));
    }
    verify(doc, registry, node, &credential.key)
}

/// Verify with the first of `keys` under which the signature value holds.
pub(crate) fn verify_any(
    doc: &Document,
    registry: &TypeRegistry,
    node: NodeId,
    keys: &[&Key],
) -> Result<()> {
    let checked = check_reference(doc, registry, node)?;
    if keys.is_empty() {
        return Err(Error::KeyNotFound("no verification key".into()));
    }
    for key in keys {
        if !key.usage.permits(KeyUsage::Signing) {
            continue;
        }
        if checked.verify_with(key)? {
            tracing::debug!(reference = checked.signature.reference_uri(), "signature valid");
            return Ok(());
        }
    }
    Err(Error::SignatureInvalid(format!(
        "signature value for {} does not verify",
        checked.signature.reference_uri()
    )))
}

/// A reference whose digest matched, with SignedInfo ready for the
/// signature value check.
struct CheckedReference<'d> {
    signature: &'d SignedSignature,
    method: SignatureMethod,
    canonical_signed_info: Vec<u8>,
}

impl CheckedReference<'_> {
    fn verify_with(&self, key: &Key) -> Result<bool> {
        match self.method.verify(
            &key.to_signing_key(),
            &self.canonical_signed_info,
            self.signature.signature_value(),
        ) {
            Ok(valid) => Ok(valid),
            // Wrong key type or a malformed value: the signature does not hold.
            Err(Error::Key(reason)) | Err(Error::Crypto(reason)) => {
                tracing::debug!(%reason, "signature check failed");
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }
}

fn check_reference<'d>(
    doc: &'d Document,
    registry: &TypeRegistry,
    node: NodeId,
) -> Result<CheckedReference<'d>> {
    let current = doc.node(node)?;
    let signature = current
        .signature()
        .and_then(SignatureContext::signed_signature)
        .ok_or_else(|| Error::Unsigned(current.name().to_string()))?;

    let mode = reference_mode(signature)?;
    let reference = signature.reference_uri().strip_prefix('#').ok_or_else(|| {
        Error::SignatureInvalid(format!(
            "reference {:?} is not a same-document reference",
            signature.reference_uri()
        ))
    })?;

    let marshalled = Marshaller::new(registry).marshal_in_context(doc, node)?;
    let target = &marshalled.element;
    let mut referenced = target.clone();
    referenced.remove_children(ns::DSIG, ns::node::SIGNATURE);
    let canonical = ulriksdal_c14n::canonicalize(
        &referenced,
        mode,
        &marshalled.inherited,
        signature.reference_prefixes(),
    )?;
    let digest = DigestMethod::from_uri(signature.digest_method())?.digest(&canonical);
    if !constant_time_eq(&digest, signature.digest_value()) {
        tracing::debug!(reference = signature.reference_uri(), "digest mismatch");
        return Err(Error::DigestMismatch(signature.reference_uri().to_owned()));
    }

    // Content matched; the reference must still name this node.
    if current.id() != Some(reference) {
        return Err(Error::SignatureInvalid(format!(
            "reference {:?} does not point at {}",
            signature.reference_uri(),
            current.name()
        )));
    }

    let mut scope: Vec<Namespace> = marshalled.inherited.clone();
    scope.extend(target.namespaces.iter().cloned());
    scope.extend(signature.element().namespaces.iter().cloned());
    let info_mode = C14nMode::from_uri(signature.canonicalization())
        .ok_or_else(|| Error::UnsupportedAlgorithm(signature.canonicalization().to_owned()))?;
    let canonical_signed_info = ulriksdal_c14n::canonicalize(
        signature.signed_info()?,
        info_mode,
        &scope,
        signature.signed_info_prefixes(),
    )?;

    Ok(CheckedReference {
        signature,
        method: SignatureMethod::from_uri(signature.signature_method())?,
        canonical_signed_info,
    })
}

/// The canonicalization the reference's transform chain ends in.
///
/// Only the enveloped-signature transform and exclusive canonicalization
/// are accepted.
fn reference_mode(signature: &SignedSignature) -> Result<C14nMode> {
    let mut mode = None;
    for uri in signature.transforms() {
        if uri == algorithm::ENVELOPED_SIGNATURE {
            continue;
        }
        match C14nMode::from_uri(uri) {
            Some(m) => mode = Some(m),
            None => return Err(Error::UnsupportedAlgorithm(format!("transform: {uri}"))),
        }
    }
    mode.ok_or_else(|| {
        Error::UnsupportedAlgorithm("reference has no exclusive canonicalization transform".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::sign_node;
    use ulriksdal_keys::KeyData;
    use ulriksdal_saml::{default_registry, ElementKind, SignatureParams};

    fn ec_key() -> Key {
        let sk = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let public = *sk.verifying_key();
        Key::new(
            KeyData::EcP256 {
                private: Some(sk),
                public,
            },
            KeyUsage::Signing,
        )
    }

    fn signed_assertion(key: &Key) -> (Document, TypeRegistry, NodeId, NodeId) {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let assertion = registry.build_kind(&mut doc, ElementKind::Assertion).unwrap();
        doc.set_id(assertion, "a1").unwrap();
        doc.set_attr(assertion, "Version", "2.0").unwrap();
        doc.set_attr(assertion, "IssueInstant", "2024-01-01T00:00:00Z").unwrap();
        let issuer = registry.build_kind(&mut doc, ElementKind::Issuer).unwrap();
        doc.set_text(issuer, Some("https://idp.example.org".into())).unwrap();
        doc.append_child(assertion, issuer).unwrap();
        sign_node(&mut doc, &registry, assertion, key, SignatureParams::default()).unwrap();
        (doc, registry, assertion, issuer)
    }

    #[test]
    fn test_verify_ok() {
        let key = ec_key();
        let (doc, registry, assertion, _) = signed_assertion(&key);
        verify(&doc, &registry, assertion, &key.public_only()).unwrap();
    }

    #[test]
    fn test_wrong_key_is_signature_invalid() {
        let (doc, registry, assertion, _) = signed_assertion(&ec_key());
        let err = verify(&doc, &registry, assertion, &ec_key()).unwrap_err();
        assert!(matches!(err, Error::SignatureInvalid(_)), "{err:?}");
    }

    #[test]
    fn test_edit_after_signing_is_digest_mismatch() {
        let key = ec_key();
        let (mut doc, registry, assertion, issuer) = signed_assertion(&key);
        doc.set_text(issuer, Some("https://evil.example.org".into())).unwrap();
        let err = verify(&doc, &registry, assertion, &key).unwrap_err();
        assert!(matches!(err, Error::DigestMismatch(_)), "{err:?}");

        // Restoring the content makes it verify again; no result was cached.
        doc.set_text(issuer, Some("https://idp.example.org".into())).unwrap();
        verify(&doc, &registry, assertion, &key).unwrap();
    }

    #[test]
    fn test_unsigned_and_pending() {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let assertion = registry.build_kind(&mut doc, ElementKind::Assertion).unwrap();
        doc.set_id(assertion, "a1").unwrap();
        let key = ec_key();
        assert!(matches!(
            verify(&doc, &registry, assertion, &key),
            Err(Error::Unsigned(_))
        ));
        doc.request_signature(assertion, SignatureParams::default()).unwrap();
        assert!(matches!(
            verify(&doc, &registry, assertion, &key),
            Err(Error::Unsigned(_))
        ));
    }

    #[test]
    fn test_encryption_key_is_skipped() {
        let key = ec_key();
        let (doc, registry, assertion, _) = signed_assertion(&key);
        let enc = key.clone().with_usage(KeyUsage::Encryption);
        let err = verify(&doc, &registry, assertion, &enc).unwrap_err();
        assert!(matches!(err, Error::SignatureInvalid(_)));
    }

    #[test]
    fn test_changed_id_is_digest_mismatch() {
        let key = ec_key();
        let (mut doc, registry, assertion, _) = signed_assertion(&key);
        doc.set_id(assertion, "a2").unwrap();
        let err = verify(&doc, &registry, assertion, &key).unwrap_err();
        assert!(matches!(err, Error::DigestMismatch(_)), "{err:?}");
    }

    #[test]
    fn test_pending_signature_elsewhere_does_not_block() {
        let key = ec_key();
        let (mut doc, registry, assertion, _) = signed_assertion(&key);
        let response = registry.build_kind(&mut doc, ElementKind::Response).unwrap();
        doc.set_id(response, "resp").unwrap();
        let other = registry.build_kind(&mut doc, ElementKind::Assertion).unwrap();
        doc.set_id(other, "a2").unwrap();
        doc.append_child(response, assertion).unwrap();
        doc.append_child(response, other).unwrap();
        doc.request_signature(response, SignatureParams::default()).unwrap();
        doc.request_signature(other, SignatureParams::default()).unwrap();

        verify(&doc, &registry, assertion, &key).unwrap();
    }

    #[test]
    fn test_indented_document_signed_elsewhere() {
        use ulriksdal_saml::{ContentSigner, Unmarshaller};

        let key = ec_key();
        let xml = "<saml:Assertion xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\" \
                   ID=\"a1\" Version=\"2.0\" IssueInstant=\"2024-01-01T00:00:00Z\">\n    \
                   <saml:Issuer>https://idp.example.org</saml:Issuer>\n</saml:Assertion>";
        let mut element = ulriksdal_xml::parse(xml).unwrap();
        let signature = crate::XmlSigner::new(&key)
            .sign("a1", &element, &[], &SignatureParams::default())
            .unwrap();
        // after the indentation, before the Issuer, as an enveloping signer
        // would place it
        element
            .children
            .insert(1, ulriksdal_xml::XmlNode::Element(signature.element().clone()));
        let received = ulriksdal_xml::to_string(&element).unwrap();

        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let assertion = Unmarshaller::new(&registry)
            .unmarshal_str(&mut doc, &received)
            .unwrap();
        verify(&doc, &registry, assertion, &key.public_only()).unwrap();

        let out = Marshaller::new(&registry).marshal_snapshot(&doc, assertion).unwrap();
        assert_eq!(ulriksdal_xml::to_string(&out.element).unwrap(), received);
    }
}
