#![forbid(unsafe_code)]

//! Enveloped signature creation.
//!
//! The signer sees the marshalled element before the signature is inserted,
//! so the enveloped-signature transform amounts to removing any stale
//! `ds:Signature` child before canonicalizing.

use rand::RngCore;

use crate::context::DsigContext;
use ulriksdal_c14n::C14nMode;
use ulriksdal_core::{ns, Error, QName, Result};
use ulriksdal_crypto::{DigestMethod, SignatureMethod};
use ulriksdal_keys::keyinfo::{encode_base64, rsa_key_value};
use ulriksdal_keys::Key;
use ulriksdal_saml::{
    ContentSigner, Document, Marshalled, Marshaller, NodeId, SignatureParams, SignedSignature,
    TypeRegistry,
};
use ulriksdal_xml::{Namespace, XmlElement};

/// Signs marshalled elements with one key.
#[derive(Debug, Clone, Copy)]
pub struct XmlSigner<'k> {
    key: &'k Key,
    include_certificates: bool,
    include_key_value: bool,
    include_key_name: bool,
}

impl<'k> XmlSigner<'k> {
    pub fn new(key: &'k Key) -> Self {
        Self {
            key,
            include_certificates: true,
            include_key_value: true,
            include_key_name: false,
        }
    }

    /// Take the KeyInfo options from a context.
    pub fn with_options(mut self, ctx: &DsigContext) -> Self {
        self.include_certificates = ctx.include_certificates;
        self.include_key_value = ctx.include_key_value;
        self.include_key_name = ctx.include_key_name;
        self
    }

    pub fn key(&self) -> &Key {
        self.key
    }

    fn key_info(&self) -> Option<XmlElement> {
        let mut key_info = XmlElement::new(ds(ns::node::KEY_INFO));
        if self.include_key_name {
            if let Some(name) = &self.key.name {
                key_info.push_element(XmlElement::new(ds(ns::node::KEY_NAME)).with_text(name.clone()));
            }
        }
        if self.include_certificates && !self.key.x509_chain.is_empty() {
            let mut data = XmlElement::new(ds(ns::node::X509_DATA));
            for der in &self.key.x509_chain {
                data.push_element(
                    XmlElement::new(ds(ns::node::X509_CERTIFICATE)).with_text(encode_base64(der)),
                );
            }
            key_info.push_element(data);
        } else if self.include_key_value {
            if let Some((modulus, exponent)) = rsa_key_value(self.key) {
                let rsa = XmlElement::new(ds(ns::node::RSA_KEY_VALUE))
                    .with_child(XmlElement::new(ds(ns::node::RSA_MODULUS)).with_text(modulus))
                    .with_child(XmlElement::new(ds(ns::node::RSA_EXPONENT)).with_text(exponent));
                key_info.push_element(XmlElement::new(ds(ns::node::KEY_VALUE)).with_child(rsa));
            }
        }
        (!key_info.children.is_empty()).then_some(key_info)
    }
}

impl ContentSigner for XmlSigner<'_> {
    fn sign(
        &self,
        reference_id: &str,
        element: &XmlElement,
        inherited: &[Namespace],
        params: &SignatureParams,
    ) -> Result<SignedSignature> {
        let mode = C14nMode::from_uri(&params.canonicalization)
            .ok_or_else(|| Error::UnsupportedAlgorithm(params.canonicalization.clone()))?;
        let digest_method = DigestMethod::from_uri(&params.digest_method)?;
        let signature_method = match &params.signature_method {
            Some(uri) => SignatureMethod::from_uri(uri)?,
            None => self.key.default_signature_method(),
        };

        let mut target = element.clone();
        let stale = target.remove_children(ns::DSIG, ns::node::SIGNATURE);
        if stale > 0 {
            tracing::debug!(element = %element.name, stale, "dropped existing signature before digest");
        }
        let canonical = ulriksdal_c14n::canonicalize(&target, mode, inherited, &params.inclusive_prefixes)?;
        let digest = digest_method.digest(&canonical);

        let signed_info = signed_info(
            reference_id,
            mode,
            signature_method,
            digest_method,
            &digest,
            &params.inclusive_prefixes,
        );

        // SignedInfo is canonicalized in the scope it will have once the
        // signature is the element's first child.
        let mut scope = inherited.to_vec();
        scope.extend(element.namespaces.iter().cloned());
        scope.push(Namespace::new(ns::prefix::DSIG, ns::DSIG));
        let canonical_info =
            ulriksdal_c14n::canonicalize(&signed_info, mode, &scope, &params.inclusive_prefixes)?;
        let value = signature_method.sign(&self.key.to_signing_key(), &canonical_info)?;

        let mut signature = XmlElement::new(ds(ns::node::SIGNATURE));
        signature.declare_namespace(ns::prefix::DSIG, ns::DSIG);
        signature.push_element(signed_info);
        signature.push_element(
            XmlElement::new(ds(ns::node::SIGNATURE_VALUE)).with_text(encode_base64(&value)),
        );
        if params.include_key_info {
            if let Some(key_info) = self.key_info() {
                signature.push_element(key_info);
            }
        }

        tracing::debug!(
            reference = reference_id,
            algorithm = signature_method.uri(),
            "signed element"
        );
        SignedSignature::from_element(signature)
    }
}

fn ds(local_name: &'static str) -> QName {
    QName::from_static(ns::DSIG, local_name, Some(ns::prefix::DSIG))
}

fn algorithm(local_name: &'static str, uri: &str) -> XmlElement {
    XmlElement::new(ds(local_name)).with_attr(ns::attr::ALGORITHM, uri)
}

fn with_prefix_list(mut element: XmlElement, prefixes: &[String]) -> XmlElement {
    if !prefixes.is_empty() {
        let mut inclusive = XmlElement::new(QName::from_static(
            ns::EXC_C14N,
            ns::node::INCLUSIVE_NAMESPACES,
            Some(ns::prefix::EXC_C14N),
        ))
        .with_attr(ns::attr::PREFIX_LIST, prefixes.join(" "));
        inclusive.declare_namespace(ns::prefix::EXC_C14N, ns::EXC_C14N);
        element.push_element(inclusive);
    }
    element
}

fn signed_info(
    reference_id: &str,
    mode: C14nMode,
    signature_method: SignatureMethod,
    digest_method: DigestMethod,
    digest: &[u8],
    prefixes: &[String],
) -> XmlElement {
    let transforms = XmlElement::new(ds(ns::node::TRANSFORMS))
        .with_child(algorithm(ns::node::TRANSFORM, ulriksdal_core::algorithm::ENVELOPED_SIGNATURE))
        .with_child(with_prefix_list(algorithm(ns::node::TRANSFORM, mode.uri()), prefixes));

    let reference = XmlElement::new(ds(ns::node::REFERENCE))
        .with_attr(ns::attr::URI, format!("#{reference_id}"))
        .with_child(transforms)
        .with_child(algorithm(ns::node::DIGEST_METHOD, digest_method.uri()))
        .with_child(XmlElement::new(ds(ns::node::DIGEST_VALUE)).with_text(encode_base64(digest)));

    XmlElement::new(ds(ns::node::SIGNED_INFO))
        .with_child(with_prefix_list(
            algorithm(ns::node::CANONICALIZATION_METHOD, mode.uri()),
            prefixes,
        ))
        .with_child(algorithm(ns::node::SIGNATURE_METHOD, signature_method.uri()))
        .with_child(reference)
}

/// A fresh `_`-prefixed random ID, valid as an `xs:ID`.
pub fn generate_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("_{}", hex::encode(bytes))
}

/// Sign `node` with `key`.
///
/// A node without an ID gets a generated one. The signature is requested
/// and the node's whole tree is marshalled, so the signature is computed in
/// the namespace scope the node will be serialized in. Signing an already
/// signed node replaces its signature.
pub fn sign_node(
    doc: &mut Document,
    registry: &TypeRegistry,
    node: NodeId,
    key: &Key,
    params: SignatureParams,
) -> Result<Marshalled> {
    sign_with(doc, registry, node, &XmlSigner::new(key), params)
}

pub(crate) fn sign_with(
    doc: &mut Document,
    registry: &TypeRegistry,
    node: NodeId,
    signer: &XmlSigner<'_>,
    params: SignatureParams,
) -> Result<Marshalled> {
    if !doc.node(node)?.is_signable() {
        return Err(Error::Tree(format!(
            "{} cannot carry a signature",
            doc.node(node)?.name()
        )));
    }
    if doc.id(node).is_none() {
        doc.set_id(node, generate_id())?;
    }
    doc.request_signature(node, params)?;
    let root = doc.root_of(node);
    Marshaller::new(registry).with_signer(signer).marshal(doc, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulriksdal_core::algorithm;
    use ulriksdal_keys::{KeyData, KeyUsage};
    use ulriksdal_saml::{default_registry, ElementKind};

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

    fn assertion(doc: &mut Document, registry: &TypeRegistry) -> NodeId {
        let assertion = registry.build_kind(doc, ElementKind::Assertion).unwrap();
        doc.set_attr(assertion, "Version", "2.0").unwrap();
        doc.set_attr(assertion, "IssueInstant", "2024-01-01T00:00:00Z").unwrap();
        let issuer = registry.build_kind(doc, ElementKind::Issuer).unwrap();
        doc.set_text(issuer, Some("https://idp.example.org".into())).unwrap();
        doc.append_child(assertion, issuer).unwrap();
        assertion
    }

    #[test]
    fn test_signature_is_first_child() {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let node = assertion(&mut doc, &registry);
        doc.set_id(node, "a1").unwrap();

        let out = sign_node(&mut doc, &registry, node, &ec_key(), SignatureParams::default()).unwrap();
        let first = out.element.child_elements().next().unwrap();
        assert!(first.name.is(ns::DSIG, ns::node::SIGNATURE));

        let signed = doc.signature(node).and_then(|s| s.signed_signature()).unwrap();
        assert_eq!(signed.reference_uri(), "#a1");
        assert_eq!(
            signed.transforms(),
            [algorithm::ENVELOPED_SIGNATURE, algorithm::EXC_C14N]
        );
        assert_eq!(signed.signature_method(), algorithm::ECDSA_SHA256);
        assert_eq!(signed.digest_method(), algorithm::SHA256);
    }

    #[test]
    fn test_generates_missing_id() {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let node = assertion(&mut doc, &registry);
        sign_node(&mut doc, &registry, node, &ec_key(), SignatureParams::default()).unwrap();
        let id = doc.id(node).unwrap();
        assert!(id.starts_with('_'));
        assert_eq!(id.len(), 33);
    }

    #[test]
    fn test_unsignable_node_rejected() {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let issuer = registry.build_kind(&mut doc, ElementKind::Issuer).unwrap();
        let err = sign_node(&mut doc, &registry, issuer, &ec_key(), SignatureParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::Tree(_)));
    }

    #[test]
    fn test_prefix_list_emitted() {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let node = assertion(&mut doc, &registry);
        let params = SignatureParams::default().with_inclusive_prefixes(vec!["xs".into()]);
        sign_node(&mut doc, &registry, node, &ec_key(), params).unwrap();
        let signed = doc.signature(node).and_then(|s| s.signed_signature()).unwrap();
        assert_eq!(signed.reference_prefixes(), ["xs"]);
        assert_eq!(signed.signed_info_prefixes(), ["xs"]);
    }

    #[test]
    fn test_key_info_options() {
        let key = ec_key().with_name("idp-signing");
        let signer = XmlSigner::new(&key);
        // EC keys have no key value form and no certificate here.
        assert!(signer.key_info().is_none());
        let ctx = DsigContext::default().include_key_name(true);
        let key_info = signer.with_options(&ctx).key_info().unwrap();
        assert_eq!(
            key_info.find_child(ns::DSIG, ns::node::KEY_NAME).unwrap().text(),
            "idp-signing"
        );
    }

    #[test]
    fn test_unknown_canonicalization_rejected() {
        let key = ec_key();
        let element = XmlElement::new(QName::new(ns::SAML2, "Assertion").with_prefix("saml"));
        let params = SignatureParams::default().with_canonicalization(algorithm::C14N);
        let err = XmlSigner::new(&key)
            .sign("a1", &element, &[], &params)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
