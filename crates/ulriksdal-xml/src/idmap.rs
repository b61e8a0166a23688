#![forbid(unsafe_code)]

//! ID attribute registration for `#id` same-document references.

use std::collections::HashMap;

use crate::element::XmlElement;
use ulriksdal_core::Error;

/// Maps ID values to the element-child index path from the tree root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    ids: HashMap<String, Vec<usize>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ID; a value may be registered only once.
    pub fn insert(&mut self, id: &str, path: Vec<usize>) -> Result<(), Error> {
        if self.ids.contains_key(id) {
            return Err(Error::DuplicateId(id.to_owned()));
        }
        self.ids.insert(id.to_owned(), path);
        Ok(())
    }

    pub fn path(&self, id: &str) -> Option<&[usize]> {
        self.ids.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Resolve a same-document reference (`#id`) against `root`.
    pub fn resolve<'a>(&self, root: &'a XmlElement, uri: &str) -> Result<&'a XmlElement, Error> {
        let id = uri
            .strip_prefix('#')
            .ok_or_else(|| Error::InvalidUri(format!("not a same-document reference: {uri}")))?;
        let path = self
            .path(id)
            .ok_or_else(|| Error::InvalidUri(format!("no element with ID {id:?}")))?;
        root.at_path(path)
            .ok_or_else(|| Error::InvalidUri(format!("stale path for ID {id:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_insert_and_resolve() {
        let root = parse(r#"<a ID="r1"><b/><c ID="c1"><d ID="d1"/></c></a>"#).unwrap();
        let mut ids = IdMap::new();
        ids.insert("r1", vec![]).unwrap();
        ids.insert("d1", vec![1, 0]).unwrap();
        assert!(ids.contains("r1"));
        assert_eq!(ids.path("d1"), Some(&[1usize, 0][..]));
        let d = ids.resolve(&root, "#d1").unwrap();
        assert_eq!(d.name.local_name(), "d");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut ids = IdMap::new();
        ids.insert("x", vec![]).unwrap();
        assert!(matches!(
            ids.insert("x", vec![0]),
            Err(Error::DuplicateId(id)) if id == "x"
        ));
        assert_eq!(ids.path("x"), Some(&[][..]));
    }

    #[test]
    fn test_resolve_requires_fragment() {
        let root = parse(r#"<a ID="x"><b/></a>"#).unwrap();
        let mut ids = IdMap::new();
        ids.insert("x", vec![]).unwrap();
        ids.insert("stale", vec![3]).unwrap();
        assert!(matches!(ids.resolve(&root, "x"), Err(Error::InvalidUri(_))));
        assert!(matches!(ids.resolve(&root, "#y"), Err(Error::InvalidUri(_))));
        assert!(matches!(ids.resolve(&root, "#stale"), Err(Error::InvalidUri(_))));
    }
}
