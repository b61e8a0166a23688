#![forbid(unsafe_code)]

//! Ulriksdal: a registry-driven SAML object model with enveloped XML
//! signatures.
//!
//! The member crates are re-exported as modules; the types most callers
//! need are also available at the top level.

pub use ulriksdal_c14n as c14n;
pub use ulriksdal_core as core;
pub use ulriksdal_crypto as crypto;
pub use ulriksdal_dsig as dsig;
pub use ulriksdal_keys as keys;
pub use ulriksdal_saml as saml;
pub use ulriksdal_xml as xml;

pub use ulriksdal_core::{Error, Result};
pub use ulriksdal_dsig::{sign_node, verify, verify_with_credential, DsigContext, XmlSigner};
pub use ulriksdal_saml::{
    default_registry, Document, ElementKind, Marshaller, NodeId, SignatureParams, TypeRegistry,
    UnknownContentPolicy, Unmarshaller, UnmarshallerConfig, ValidationMode, ValidatorSuite,
};

/// Parse `xml` and unmarshal its root into `doc`.
pub fn load(
    doc: &mut Document,
    registry: &TypeRegistry,
    xml: &str,
    config: UnmarshallerConfig,
) -> Result<NodeId> {
    Unmarshaller::with_config(registry, config).unmarshal_str(doc, xml)
}

/// Marshal `node` and serialize it without added whitespace.
///
/// Formatting read from the input is written back as it was. Signed trees
/// must be written this way: whitespace added by pretty printing becomes
/// content once the document is read back.
pub fn to_xml(doc: &Document, registry: &TypeRegistry, node: NodeId) -> Result<String> {
    let marshalled = Marshaller::new(registry).marshal_snapshot(doc, node)?;
    ulriksdal_xml::to_string(&marshalled.element)
}

/// Marshal `node` and serialize it indented.
pub fn to_xml_pretty(doc: &Document, registry: &TypeRegistry, node: NodeId) -> Result<String> {
    let marshalled = Marshaller::new(registry).marshal_snapshot(doc, node)?;
    ulriksdal_xml::to_string_pretty(&marshalled.element)
}
