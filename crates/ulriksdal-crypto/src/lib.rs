#![forbid(unsafe_code)]

//! Cryptographic primitives for Ulriksdal signatures.
//!
//! Digests and signature algorithms are selected by their XML-DSig URI.

pub mod digest;
pub mod sign;

pub use digest::DigestMethod;
pub use sign::{SignatureMethod, SigningKey};
