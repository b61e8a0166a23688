#![forbid(unsafe_code)]

//! Shared foundation for the Ulriksdal workspace.
//!
//! Holds the error taxonomy every crate returns, the [`QName`] identity used
//! for registry dispatch, and the namespace and algorithm URI constants.

pub mod algorithm;
pub mod error;
pub mod ns;
pub mod qname;

pub use error::{
    Error, ResolutionErrorKind, Result, ValidationError, ValidationErrorKind, ValidationErrors,
};
pub use qname::QName;
