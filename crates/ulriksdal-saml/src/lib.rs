#![forbid(unsafe_code)]

//! Registry-driven SAML object model.
//!
//! Protocol objects live in an arena [`Document`]. A [`TypeRegistry`] maps
//! each qualified element name to the handlers that build, marshal,
//! unmarshal and validate it; the engines dispatch through it.
//!
//! ```text
//! XmlElement ──Unmarshaller──▶ Document ──ValidatorSuite──▶ ok / errors
//!                                 │
//!                                 └──Marshaller (+ContentSigner)──▶ XmlElement
//! ```

pub mod binding;
pub mod credential;
pub mod document;
pub mod kind;
pub mod marshal;
pub mod registry;
pub mod schema;
pub mod signature;
pub mod unmarshal;
pub mod validation;
pub mod validators;
pub mod views;

pub use credential::{
    resolve, resolve_credential, role_credentials, Credential, CredentialContext, CredentialUsage,
};
pub use document::{Capabilities, Document, Node, NodeId};
pub use kind::ElementKind;
pub use marshal::{Marshalled, Marshaller};
pub use registry::{
    ObjectBuilder, ObjectMarshaller, ObjectUnmarshaller, RegistryEntry, TypeRegistry,
    TypeRegistryBuilder, Validator,
};
pub use schema::{default_registry, register_defaults};
pub use signature::{
    ContentSigner, Placement, SignatureContext, SignatureParams, SignatureState, SignedSignature,
};
pub use unmarshal::{UnknownContentPolicy, Unmarshaller, UnmarshallerConfig};
pub use validation::{ValidationMode, ValidatorSuite};
