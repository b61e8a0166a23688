#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N) over an [`XmlElement`] subtree.
//!
//! Only "visibly utilized" namespace declarations are output. A prefix is
//! visibly utilized by an element when its tag name or one of its attributes
//! uses it, or when it appears in the InclusiveNamespaces PrefixList
//! (`#default` naming the default namespace).

use std::collections::{BTreeMap, HashSet};

use crate::render::{escape_text, Attr, NsDecl};
use ulriksdal_core::{ns, Error};
use ulriksdal_xml::{Namespace, XmlElement, XmlNode};

/// Canonicalize `apex` and its descendants.
///
/// `inherited` holds the bindings in scope at the apex from ancestors that
/// are not part of the output.
pub fn canonicalize(
    apex: &XmlElement,
    inherited: &[Namespace],
    with_comments: bool,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let mut in_scope = BTreeMap::new();
    apply_declarations(&mut in_scope, inherited);

    let utilized_extra: HashSet<String> = inclusive_prefixes
        .iter()
        .map(|p| if p == "#default" { String::new() } else { p.clone() })
        .collect();

    let ctx = ExcC14n {
        with_comments,
        inclusive_prefixes: utilized_extra,
    };
    let mut output = Vec::new();
    ctx.element(apex, &in_scope, &BTreeMap::new(), 1, &mut output)?;
    Ok(output)
}

struct ExcC14n {
    with_comments: bool,
    inclusive_prefixes: HashSet<String>,
}

impl ExcC14n {
    fn element(
        &self,
        element: &XmlElement,
        parent_scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
        depth: usize,
        output: &mut Vec<u8>,
    ) -> Result<(), Error> {
        if depth > ulriksdal_xml::MAX_DEPTH {
            return Err(Error::Canonicalization(format!(
                "{} is nested deeper than {} levels",
                element.name,
                ulriksdal_xml::MAX_DEPTH
            )));
        }
        let mut scope = parent_scope.clone();
        apply_declarations(&mut scope, &element.namespaces);

        let elem_prefix = element.name.prefix().unwrap_or("").to_owned();
        if !elem_prefix.is_empty() && !scope.contains_key(&elem_prefix) {
            return Err(Error::Canonicalization(format!(
                "undeclared prefix {elem_prefix:?} on {}",
                element.name
            )));
        }

        let mut utilized: HashSet<String> = self.inclusive_prefixes.clone();
        utilized.insert(elem_prefix);

        let mut attrs = Vec::with_capacity(element.attributes.len());
        for attr in &element.attributes {
            let ns_uri = attr.name.namespace();
            let qualified_name = if ns_uri.is_empty() {
                attr.name.local_name().to_owned()
            } else if ns_uri == ns::XML {
                format!("{}:{}", ns::prefix::XML, attr.name.local_name())
            } else {
                let prefix = attr.name.prefix().ok_or_else(|| {
                    Error::Canonicalization(format!(
                        "attribute {} on {} has no prefix",
                        attr.name, element.name
                    ))
                })?;
                utilized.insert(prefix.to_owned());
                format!("{prefix}:{}", attr.name.local_name())
            };
            attrs.push(Attr {
                ns_uri: ns_uri.to_owned(),
                local_name: attr.name.local_name().to_owned(),
                qualified_name,
                value: attr.value.clone(),
            });
        }
        attrs.sort();

        let mut ns_decls = Vec::new();
        for prefix in &utilized {
            if prefix == ns::prefix::XML {
                continue;
            }
            match scope.get(prefix) {
                Some(uri) if rendered.get(prefix) != Some(uri) => ns_decls.push(NsDecl {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                }),
                Some(_) => {}
                None if prefix.is_empty() => {
                    // Default namespace went out of scope below a rendered one.
                    if rendered.get("").is_some_and(|uri| !uri.is_empty()) {
                        ns_decls.push(NsDecl {
                            prefix: String::new(),
                            uri: String::new(),
                        });
                    }
                }
                None => {}
            }
        }
        ns_decls.sort();

        let name = element.qualified_name();
        output.push(b'<');
        output.extend_from_slice(name.as_bytes());
        for decl in &ns_decls {
            decl.render(output);
        }
        for attr in &attrs {
            attr.render(output);
        }
        output.push(b'>');

        let mut child_rendered = rendered.clone();
        for decl in ns_decls {
            child_rendered.insert(decl.prefix, decl.uri);
        }

        for child in &element.children {
            match child {
                XmlNode::Element(e) => {
                    self.element(e, &scope, &child_rendered, depth + 1, output)?
                }
                XmlNode::Text(t) => escape_text(t, output),
                XmlNode::Comment(c) => {
                    if self.with_comments {
                        output.extend_from_slice(b"<!--");
                        output.extend_from_slice(c.as_bytes());
                        output.extend_from_slice(b"-->");
                    }
                }
            }
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// Apply declarations to a scope; an empty URI removes the binding.
fn apply_declarations(scope: &mut BTreeMap<String, String>, decls: &[Namespace]) {
    for decl in decls {
        if decl.prefix == ns::prefix::XML {
            continue;
        }
        if decl.uri.is_empty() {
            scope.remove(&decl.prefix);
        } else {
            scope.insert(decl.prefix.clone(), decl.uri.clone());
        }
    }
}
