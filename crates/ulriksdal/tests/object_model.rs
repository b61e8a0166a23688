#![forbid(unsafe_code)]

use ulriksdal::c14n::{canonicalize, C14nMode};
use ulriksdal::core::{Error, ValidationErrorKind};
use ulriksdal::saml::views::{Assertion, Status};
use ulriksdal::{
    default_registry, Document, ElementKind, Marshaller, UnknownContentPolicy, Unmarshaller,
    UnmarshallerConfig, ValidationMode, ValidatorSuite,
};

const ASSERTION: &str = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:xs="http://www.w3.org/2001/XMLSchema" ID="a1" Version="2.0" IssueInstant="2024-05-01T12:00:00Z"><saml:Issuer>https://idp.example.org</saml:Issuer><saml:Subject><saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">alice@example.org</saml:NameID></saml:Subject><saml:Conditions NotBefore="2024-05-01T12:00:00Z" NotOnOrAfter="2024-05-01T12:05:00Z"><saml:AudienceRestriction><saml:Audience>https://sp.example.org</saml:Audience></saml:AudienceRestriction></saml:Conditions></saml:Assertion>"#;

fn canonical(element: &ulriksdal::xml::XmlElement) -> String {
    String::from_utf8(canonicalize(element, C14nMode::Exclusive, &[], &[]).unwrap()).unwrap()
}

#[test]
fn round_trip_preserves_content() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let root = Unmarshaller::new(&registry)
        .unmarshal_str(&mut doc, ASSERTION)
        .unwrap();

    let view = Assertion::new(&doc, root).unwrap();
    assert_eq!(view.id(), Some("a1"));
    assert_eq!(view.subject_name_id(), Some("alice@example.org"));
    assert_eq!(view.audiences(), ["https://sp.example.org"]);
    assert_eq!(view.issue_instant().map(|t| t.timestamp()), Some(1_714_564_800));

    let out = Marshaller::new(&registry).marshal_snapshot(&doc, root).unwrap();
    let original = ulriksdal::xml::parse(ASSERTION).unwrap();
    assert_eq!(canonical(&out.element), canonical(&original));
    assert_eq!(out.element.declared_namespace("xs"), Some("http://www.w3.org/2001/XMLSchema"));

    // Serializing is a fixed point.
    let first = ulriksdal::to_xml(&doc, &registry, root).unwrap();
    let mut again = Document::new();
    let reread = Unmarshaller::new(&registry)
        .unmarshal_str(&mut again, &first)
        .unwrap();
    assert_eq!(ulriksdal::to_xml(&again, &registry, reread).unwrap(), first);
}

#[test]
fn unknown_content_strict_vs_lenient() {
    let registry = default_registry().unwrap();
    let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="a1" Version="2.0" IssueInstant="2024-05-01T12:00:00Z" Flavour="vanilla"><saml:Issuer>idp</saml:Issuer><saml:Extra>ignored</saml:Extra></saml:Assertion>"#;

    let mut doc = Document::new();
    let err = Unmarshaller::new(&registry)
        .unmarshal_str(&mut doc, xml)
        .unwrap_err();
    assert!(matches!(err, Error::Unmarshalling { .. }));
    assert!(matches!(err.root_cause(), Error::UnknownAttribute { .. }));
    // Nothing from the failed attempt remains.
    assert!(doc.is_empty());
    assert!(doc.lookup_id("a1").is_none());

    let lenient = Unmarshaller::with_config(&registry, UnmarshallerConfig::lenient());
    assert_eq!(lenient.policy(), UnknownContentPolicy::Skip);
    let root = lenient.unmarshal_str(&mut doc, xml).unwrap();
    assert_eq!(doc.node(root).unwrap().attr("Flavour"), None);
    let kinds: Vec<_> = doc
        .children(root)
        .iter()
        .map(|&c| doc.node(c).unwrap().kind())
        .collect();
    assert_eq!(kinds, [Some(ElementKind::Issuer)]);
}

#[test]
fn unknown_child_element_fails_strictly() {
    let registry = default_registry().unwrap();
    let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="a1" Version="2.0" IssueInstant="2024-05-01T12:00:00Z"><saml:Issuer>idp</saml:Issuer><saml:Extra/></saml:Assertion>"#;
    let mut doc = Document::new();
    let err = Unmarshaller::new(&registry)
        .unmarshal_str(&mut doc, xml)
        .unwrap_err();
    assert!(matches!(err.root_cause(), Error::UnknownElement { .. }));
}

#[test]
fn unregistered_root_is_unknown_element() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let err = Unmarshaller::new(&registry)
        .unmarshal_str(&mut doc, r#"<x:Root xmlns:x="urn:x"/>"#)
        .unwrap_err();
    match err.root_cause() {
        Error::UnknownElement { parent, element } => {
            assert_eq!(parent.local_name(), "#document");
            assert_eq!(element.local_name(), "Root");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_child_then_added() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let response = registry.build_kind(&mut doc, ElementKind::Response).unwrap();
    doc.set_id(response, "r1").unwrap();
    doc.set_attr(response, "Version", "2.0").unwrap();
    doc.set_attr(response, "IssueInstant", "2024-05-01T12:00:00Z").unwrap();

    let suite = ValidatorSuite::new(&registry);
    let err = suite.validate(&doc, response).unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::MissingRequiredChild);

    let status = registry.build_kind(&mut doc, ElementKind::Status).unwrap();
    let code = registry.build_kind(&mut doc, ElementKind::StatusCode).unwrap();
    doc.set_attr(code, "Value", ulriksdal::core::ns::status::SUCCESS).unwrap();
    doc.append_child(status, code).unwrap();
    doc.append_child(response, status).unwrap();

    suite.validate_tree(&doc, response).unwrap();
    assert!(Status::new(&doc, status).unwrap().is_success());
}

#[test]
fn collect_all_reports_every_violation() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let response = registry.build_kind(&mut doc, ElementKind::Response).unwrap();
    doc.set_attr(response, "Version", "1.1").unwrap();

    let fail_fast = ValidatorSuite::new(&registry).validate(&doc, response).unwrap_err();
    assert_eq!(fail_fast.validation_errors().unwrap().len(), 1);

    let all = ValidatorSuite::new(&registry)
        .with_mode(ValidationMode::CollectAll)
        .validate(&doc, response)
        .unwrap_err();
    let kinds: Vec<_> = all.validation_errors().unwrap().iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&ValidationErrorKind::MissingRequiredAttribute));
    assert!(kinds.contains(&ValidationErrorKind::MissingRequiredChild));
    assert!(kinds.contains(&ValidationErrorKind::InvalidValue));
}

#[test]
fn duplicate_id_rejected_on_second_assignment() {
    let registry = default_registry().unwrap();
    let mut doc = Document::new();
    let first = registry.build_kind(&mut doc, ElementKind::Assertion).unwrap();
    let second = registry.build_kind(&mut doc, ElementKind::Assertion).unwrap();
    doc.set_id(first, "dup").unwrap();
    assert!(matches!(doc.set_id(second, "dup"), Err(Error::DuplicateId(_))));
    assert_eq!(doc.lookup_id("dup"), Some(first));
    assert_eq!(doc.id(second), None);

    // A parsed document with the same ID collides with the existing node.
    let err = Unmarshaller::new(&registry)
        .unmarshal_str(&mut doc, &ASSERTION.replace("ID=\"a1\"", "ID=\"dup\""))
        .unwrap_err();
    assert!(matches!(err.root_cause(), Error::DuplicateId(_)));
    assert_eq!(doc.lookup_id("dup"), Some(first));
}
