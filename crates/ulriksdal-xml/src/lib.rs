#![forbid(unsafe_code)]

//! XML element tree for the Ulriksdal object model.
//!
//! Parsing goes through `roxmltree`, serialization through `quick-xml`. The
//! tree itself is an owned structure that can be built, mutated and
//! canonicalized without holding on to the source text.

pub mod document;
pub mod element;
pub mod idmap;
pub mod writer;

pub use document::{parse, parse_bytes, parse_with_max_depth};
pub use element::{Namespace, XmlAttribute, XmlElement, XmlNode};
pub use idmap::IdMap;
pub use writer::{to_string, to_string_pretty};

/// Deepest element nesting accepted when parsing, unmarshalling, marshalling
/// and serializing. Protocol messages stay far below it.
pub const MAX_DEPTH: usize = 128;

/// Return roxmltree parsing options that refuse DTDs.
///
/// Protocol messages never carry a DTD; refusing them closes off entity
/// expansion tricks.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}
