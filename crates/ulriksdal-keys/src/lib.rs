#![forbid(unsafe_code)]

//! Key management for Ulriksdal.
//!
//! Loads RSA and EC keys from PEM, DER and X.509 certificates, converts
//! key material to and from `ds:KeyInfo` text, and provides a
//! `KeysManager` for named key lookup.

pub mod key;
pub mod keyinfo;
pub mod loader;
pub mod manager;

pub use key::{Key, KeyData, KeyUsage};
pub use manager::KeysManager;
