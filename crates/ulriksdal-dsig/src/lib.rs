#![forbid(unsafe_code)]

//! Enveloped XML signatures over SAML object trees.
//!
//! [`XmlSigner`] plugs into the marshaller as its [`ContentSigner`]: a node
//! with a pending signature request is signed while it is marshalled and
//! the `ds:Signature` lands as its first child. [`verify`] re-marshals the
//! tree and checks the reference digest and the signature value every
//! time it is called.
//!
//! [`ContentSigner`]: ulriksdal_saml::ContentSigner

pub mod context;
pub mod sign;
pub mod verify;

pub use context::DsigContext;
pub use sign::{generate_id, sign_node, XmlSigner};
pub use verify::{verify, verify_with_credential};
