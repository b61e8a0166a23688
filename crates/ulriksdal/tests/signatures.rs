#![forbid(unsafe_code)]

use ulriksdal::core::{ns, Error};
use ulriksdal::keys::{Key, KeyData, KeyUsage};
use ulriksdal::saml::views::Assertion;
use ulriksdal::{
    default_registry, sign_node, verify, Document, DsigContext, ElementKind, NodeId,
    SignatureParams, TypeRegistry, Unmarshaller,
};

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

/// An assertion with an ID and one Issuer leaf, inside a Response.
fn response_with_assertion(registry: &TypeRegistry, doc: &mut Document) -> (NodeId, NodeId) {
    let response = registry.build_kind(doc, ElementKind::Response).unwrap();
    doc.set_id(response, "resp-1").unwrap();
    doc.set_attr(response, "Version", "2.0").unwrap();
    doc.set_attr(response, "IssueInstant", "2024-05-01T12:00:00Z").unwrap();
    let status = registry.build_kind(doc, ElementKind::Status).unwrap();
    let code = registry.build_kind(doc, ElementKind::StatusCode).unwrap();
    doc.set_attr(code, "Value", ns::status::SUCCESS).unwrap();
    doc.append_child(status, code).unwrap();
    doc.append_child(response, status).unwrap();

    let assertion = registry.build_kind(doc, ElementKind::Assertion).unwrap();
    doc.set_id(assertion, "r1").unwrap();
    doc.set_attr(assertion, "Version", "2.0").unwrap();
    doc.set_attr(assertion, "IssueInstant", "2024-05-01T12:00:00Z").unwrap();
    let issuer = registry.build_kind(doc, ElementKind::Issuer).unwrap();
    doc.set_text(issuer, Some("https://idp.example.org".into())).unwrap();
    doc.append_child(assertion, issuer).unwrap();
    doc.append_child(response, assertion).unwrap();
    (response, assertion)
}

#[test]
fn signature_verifies_with_matching_key_only() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let (_, assertion) = response_with_assertion(&registry, &mut doc);
    let key = ec_key();

    sign_node(&mut doc, &registry, assertion, &key, SignatureParams::default()).unwrap();
    verify(&doc, &registry, assertion, &key.public_only()).unwrap();

    let err = verify(&doc, &registry, assertion, &ec_key()).unwrap_err();
    assert!(matches!(err, Error::SignatureInvalid(_)), "{err:?}");
}

#[test]
fn mutated_attribute_is_digest_mismatch() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let (_, assertion) = response_with_assertion(&registry, &mut doc);
    let key = ec_key();
    sign_node(&mut doc, &registry, assertion, &key, SignatureParams::default()).unwrap();

    doc.set_attr(assertion, "IssueInstant", "2030-01-01T00:00:00Z").unwrap();
    let err = verify(&doc, &registry, assertion, &key).unwrap_err();
    assert!(matches!(err, Error::DigestMismatch(_)), "{err:?}");
}

#[test]
fn unsigned_node_is_reported_as_unsigned() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let (response, assertion) = response_with_assertion(&registry, &mut doc);
    sign_node(&mut doc, &registry, assertion, &ec_key(), SignatureParams::default()).unwrap();
    let err = verify(&doc, &registry, response, &ec_key()).unwrap_err();
    assert!(matches!(err, Error::Unsigned(_)), "{err:?}");
}

#[test]
fn signed_document_survives_the_wire() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let (response, assertion) = response_with_assertion(&registry, &mut doc);
    let key = ec_key();
    let out = sign_node(&mut doc, &registry, assertion, &key, SignatureParams::default()).unwrap();
    assert!(out.ids.contains("r1"));
    assert!(out.ids.contains("resp-1"));

    let xml = ulriksdal::to_xml(&doc, &registry, response).unwrap();

    let mut received = Document::new();
    let root = Unmarshaller::new(&registry)
        .unmarshal_str(&mut received, &xml)
        .unwrap();
    let node = received.lookup_id("r1").unwrap();
    assert_eq!(received.root_of(node), root);
    assert!(Assertion::new(&received, node).unwrap().has_signature());
    verify(&received, &registry, node, &key.public_only()).unwrap();

    // Re-marshalling the received tree reproduces the bytes.
    assert_eq!(ulriksdal::to_xml(&received, &registry, root).unwrap(), xml);

    // Content tampered in transit.
    let tampered = xml.replace("https://idp.example.org", "https://evil.example.org");
    let mut forged = Document::new();
    Unmarshaller::new(&registry)
        .unmarshal_str(&mut forged, &tampered)
        .unwrap();
    let node = forged.lookup_id("r1").unwrap();
    let err = verify(&forged, &registry, node, &key).unwrap_err();
    assert!(matches!(err, Error::DigestMismatch(_)), "{err:?}");
}

#[test]
fn assertion_signed_alone_verifies_inside_response() {
    let registry = default_registry().unwrap();
    let key = ec_key();

    let mut doc = Document::new();
    let assertion = registry.build_kind(&mut doc, ElementKind::Assertion).unwrap();
    doc.set_attr(assertion, "Version", "2.0").unwrap();
    doc.set_attr(assertion, "IssueInstant", "2024-05-01T12:00:00Z").unwrap();
    let issuer = registry.build_kind(&mut doc, ElementKind::Issuer).unwrap();
    doc.set_text(issuer, Some("https://idp.example.org".into())).unwrap();
    doc.append_child(assertion, issuer).unwrap();
    sign_node(&mut doc, &registry, assertion, &key, SignatureParams::default()).unwrap();

    // Embedding moves the assertion under a parent that declares the same
    // prefix; exclusive canonicalization keeps the digest stable.
    let response = registry.build_kind(&mut doc, ElementKind::Response).unwrap();
    let status = registry.build_kind(&mut doc, ElementKind::Status).unwrap();
    doc.append_child(response, status).unwrap();
    doc.append_child(response, assertion).unwrap();
    verify(&doc, &registry, assertion, &key).unwrap();
}

#[test]
fn resigning_replaces_the_signature() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let (_, assertion) = response_with_assertion(&registry, &mut doc);
    let first = ec_key();
    let second = ec_key();
    sign_node(&mut doc, &registry, assertion, &first, SignatureParams::default()).unwrap();
    let out = sign_node(&mut doc, &registry, assertion, &second, SignatureParams::default()).unwrap();

    let path = out.ids.path("r1").unwrap();
    let element = out.element.at_path(path).unwrap();
    assert_eq!(element.find_children(ns::DSIG, ns::node::SIGNATURE).count(), 1);
    verify(&doc, &registry, assertion, &second).unwrap();
    assert!(matches!(
        verify(&doc, &registry, assertion, &first),
        Err(Error::SignatureInvalid(_))
    ));
}

#[test]
fn context_tries_each_key() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let (_, assertion) = response_with_assertion(&registry, &mut doc);
    let signer = ec_key();
    DsigContext::with_key(signer.clone())
        .sign(&mut doc, &registry, assertion, SignatureParams::default())
        .unwrap();

    let mut keys = ulriksdal::keys::KeysManager::new();
    keys.add_key(ec_key().public_only());
    keys.add_key(signer.public_only());
    DsigContext::new(keys).verify(&doc, &registry, assertion).unwrap();

    let mut strangers = ulriksdal::keys::KeysManager::new();
    strangers.add_key(ec_key());
    assert!(matches!(
        DsigContext::new(strangers).verify(&doc, &registry, assertion),
        Err(Error::SignatureInvalid(_))
    ));
}

#[test]
fn pending_signature_blocks_plain_serialization() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let (response, assertion) = response_with_assertion(&registry, &mut doc);
    doc.request_signature(assertion, SignatureParams::default()).unwrap();
    assert!(matches!(
        ulriksdal::to_xml(&doc, &registry, response),
        Err(Error::Marshalling { .. })
    ));
}

#[test]
fn indented_document_keeps_its_signature() {
    let registry = default_registry().unwrap();
    let xml = "<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" \
               ID=\"resp-1\" Version=\"2.0\" IssueInstant=\"2024-05-01T12:00:00Z\">\n  \
               <samlp:Status>\n    \
               <samlp:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\"/>\n  \
               </samlp:Status>\n  \
               <saml:Assertion xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\" \
               ID=\"r1\" Version=\"2.0\" IssueInstant=\"2024-05-01T12:00:00Z\">\n    \
               <saml:Issuer>https://idp.example.org</saml:Issuer>\n  \
               </saml:Assertion>\n</samlp:Response>";
    let key = ec_key();

    let mut doc = Document::new();
    let response = Unmarshaller::new(&registry)
        .unmarshal_str(&mut doc, xml)
        .unwrap();
    let assertion = doc.lookup_id("r1").unwrap();
    sign_node(&mut doc, &registry, assertion, &key, SignatureParams::default()).unwrap();
    verify(&doc, &registry, assertion, &key.public_only()).unwrap();

    let signed = ulriksdal::to_xml(&doc, &registry, response).unwrap();
    assert!(signed.contains("\n    <saml:Issuer>"));

    let mut received = Document::new();
    let root = Unmarshaller::new(&registry)
        .unmarshal_str(&mut received, &signed)
        .unwrap();
    let node = received.lookup_id("r1").unwrap();
    verify(&received, &registry, node, &key.public_only()).unwrap();
    assert_eq!(ulriksdal::to_xml(&received, &registry, root).unwrap(), signed);
}
