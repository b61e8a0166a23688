#![forbid(unsafe_code)]

//! Typed read-only views over object tree nodes.

use chrono::{DateTime, Utc};

use crate::binding::{parse_boolean, parse_date_time};
use crate::credential::CredentialUsage;
use crate::document::{Document, Node, NodeId};
use crate::kind::ElementKind;
use ulriksdal_core::{ns, Error, Result};

macro_rules! view {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'d> {
            doc: &'d Document,
            id: NodeId,
            node: &'d Node,
        }

        impl<'d> $name<'d> {
            /// Wrap `node`, checking its kind.
            pub fn new(doc: &'d Document, node: NodeId) -> Result<Self> {
                let n = doc.node(node)?;
                if !matches!(n.kind(), $(Some(ElementKind::$kind))|+) {
                    return Err(Error::Tree(format!(
                        "{} is not a {}",
                        n.name(),
                        stringify!($name)
                    )));
                }
                Ok(Self { doc, id: node, node: n })
            }

            pub fn node_id(&self) -> NodeId {
                self.id
            }

            #[allow(dead_code)]
            fn node(&self) -> &'d Node {
                self.node
            }

            #[allow(dead_code)]
            fn attr(&self, name: &str) -> Option<&'d str> {
                self.node().attr(name)
            }

            #[allow(dead_code)]
            fn child(&self, kind: ElementKind) -> Option<NodeId> {
                self.doc.first_child_of_kind(self.id, kind)
            }

            #[allow(dead_code)]
            fn children(&self, kind: ElementKind) -> impl Iterator<Item = NodeId> + 'd {
                self.doc.children_of_kind(self.id, kind)
            }

            #[allow(dead_code)]
            fn child_text(&self, kind: ElementKind) -> Option<&'d str> {
                self.child(kind)
                    .and_then(|c| self.doc.get(c))
                    .and_then(Node::text)
            }
        }
    };
}

view!(
    /// `samlp:Status`.
    Status, Status
);
view!(StatusCode, StatusCode);
view!(Assertion, Assertion);
view!(Issuer, Issuer);
view!(EntityDescriptor, EntityDescriptor);
view!(
    /// Any concrete metadata role descriptor.
    RoleDescriptor, IdpSsoDescriptor | SpSsoDescriptor | AttributeAuthorityDescriptor
);
view!(KeyDescriptor, KeyDescriptor);
view!(Organization, Organization);
view!(
    /// A metadata service endpoint, indexed or not.
    Endpoint,
    SingleSignOnService
        | SingleLogoutService
        | ArtifactResolutionService
        | AssertionConsumerService
        | AttributeService
);

impl<'d> Status<'d> {
    pub fn code(&self) -> Option<StatusCode<'d>> {
        self.child(ElementKind::StatusCode)
            .and_then(|c| StatusCode::new(self.doc, c).ok())
    }

    pub fn message(&self) -> Option<&'d str> {
        self.child_text(ElementKind::StatusMessage)
    }

    pub fn is_success(&self) -> bool {
        self.code().and_then(|c| c.value()) == Some(ns::status::SUCCESS)
    }
}

impl<'d> StatusCode<'d> {
    pub fn value(&self) -> Option<&'d str> {
        self.attr(ns::attr::VALUE)
    }

    /// The second-level code, if any.
    pub fn nested(&self) -> Option<StatusCode<'d>> {
        self.child(ElementKind::StatusCode)
            .and_then(|c| StatusCode::new(self.doc, c).ok())
    }
}

impl<'d> Assertion<'d> {
    pub fn id(&self) -> Option<&'d str> {
        self.node().id()
    }

    pub fn version(&self) -> Option<&'d str> {
        self.attr(ns::attr::VERSION)
    }

    pub fn issue_instant(&self) -> Option<DateTime<Utc>> {
        self.attr(ns::attr::ISSUE_INSTANT).and_then(parse_date_time)
    }

    pub fn issuer(&self) -> Option<Issuer<'d>> {
        self.child(ElementKind::Issuer)
            .and_then(|c| Issuer::new(self.doc, c).ok())
    }

    /// `Subject/NameID` text.
    pub fn subject_name_id(&self) -> Option<&'d str> {
        let subject = self.child(ElementKind::Subject)?;
        let name_id = self.doc.first_child_of_kind(subject, ElementKind::NameId)?;
        self.doc.get(name_id)?.text()
    }

    pub fn audiences(&self) -> Vec<&'d str> {
        let Some(conditions) = self.child(ElementKind::Conditions) else {
            return Vec::new();
        };
        self.doc
            .children_of_kind(conditions, ElementKind::AudienceRestriction)
            .flat_map(|r| self.doc.children_of_kind(r, ElementKind::Audience))
            .filter_map(|a| self.doc.get(a).and_then(Node::text))
            .collect()
    }

    /// Whether a signature is attached. Says nothing about its validity.
    pub fn has_signature(&self) -> bool {
        self.node().signature().is_some()
    }
}

impl<'d> Issuer<'d> {
    pub fn value(&self) -> Option<&'d str> {
        self.node().text()
    }

    pub fn format(&self) -> Option<&'d str> {
        self.attr("Format")
    }
}

impl<'d> EntityDescriptor<'d> {
    pub fn entity_id(&self) -> Option<&'d str> {
        self.attr(ns::attr::ENTITY_ID)
    }

    pub fn roles(&self) -> Vec<RoleDescriptor<'d>> {
        self.doc
            .children(self.id)
            .iter()
            .filter_map(|c| RoleDescriptor::new(self.doc, *c).ok())
            .collect()
    }

    pub fn idp_sso(&self) -> Option<RoleDescriptor<'d>> {
        self.role(ElementKind::IdpSsoDescriptor)
    }

    pub fn sp_sso(&self) -> Option<RoleDescriptor<'d>> {
        self.role(ElementKind::SpSsoDescriptor)
    }

    fn role(&self, kind: ElementKind) -> Option<RoleDescriptor<'d>> {
        self.child(kind)
            .and_then(|c| RoleDescriptor::new(self.doc, c).ok())
    }

    pub fn organization(&self) -> Option<Organization<'d>> {
        self.child(ElementKind::Organization)
            .and_then(|c| Organization::new(self.doc, c).ok())
    }
}

impl<'d> RoleDescriptor<'d> {
    pub fn kind(&self) -> ElementKind {
        // constructor guarantees a built-in role kind
        self.node().kind().unwrap_or(ElementKind::SpSsoDescriptor)
    }

    pub fn protocols(&self) -> Vec<&'d str> {
        self.attr(ns::attr::PROTOCOL_SUPPORT_ENUMERATION)
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn supports(&self, protocol: &str) -> bool {
        self.protocols().contains(&protocol)
    }

    pub fn key_descriptors(&self) -> Vec<KeyDescriptor<'d>> {
        self.children(ElementKind::KeyDescriptor)
            .filter_map(|c| KeyDescriptor::new(self.doc, c).ok())
            .collect()
    }

    pub fn endpoints(&self, kind: ElementKind) -> Vec<Endpoint<'d>> {
        self.children(kind)
            .filter_map(|c| Endpoint::new(self.doc, c).ok())
            .collect()
    }

    /// The endpoint of `kind` for `binding`, preferring one marked default.
    pub fn endpoint(&self, kind: ElementKind, binding: &str) -> Option<Endpoint<'d>> {
        let candidates: Vec<_> = self
            .endpoints(kind)
            .into_iter()
            .filter(|e| e.binding() == Some(binding))
            .collect();
        candidates
            .iter()
            .copied()
            .find(|e| e.is_default() == Some(true))
            .or_else(|| candidates.first().copied())
    }

    pub fn want_authn_requests_signed(&self) -> Option<bool> {
        self.attr("WantAuthnRequestsSigned").and_then(parse_boolean)
    }

    pub fn want_assertions_signed(&self) -> Option<bool> {
        self.attr("WantAssertionsSigned").and_then(parse_boolean)
    }

    pub fn name_id_formats(&self) -> Vec<&'d str> {
        self.children(ElementKind::NameIdFormat)
            .filter_map(|c| self.doc.get(c).and_then(Node::text))
            .collect()
    }
}

impl<'d> KeyDescriptor<'d> {
    pub fn usage(&self) -> Result<CredentialUsage> {
        CredentialUsage::from_use(self.attr(ns::attr::USE))
    }

    pub fn key_info(&self) -> Option<NodeId> {
        self.child(ElementKind::KeyInfo)
    }

    pub fn encryption_methods(&self) -> Vec<&'d str> {
        self.children(ElementKind::EncryptionMethod)
            .filter_map(|c| self.doc.get(c).and_then(|n| n.attr(ns::attr::ALGORITHM)))
            .collect()
    }
}

/// A string with its `xml:lang`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Localized<'d> {
    pub lang: &'d str,
    pub value: &'d str,
}

impl<'d> Organization<'d> {
    pub fn names(&self) -> Vec<Localized<'d>> {
        self.localized(ElementKind::OrganizationName)
    }

    pub fn display_names(&self) -> Vec<Localized<'d>> {
        self.localized(ElementKind::OrganizationDisplayName)
    }

    pub fn urls(&self) -> Vec<Localized<'d>> {
        self.localized(ElementKind::OrganizationUrl)
    }

    fn localized(&self, kind: ElementKind) -> Vec<Localized<'d>> {
        self.children(kind)
            .filter_map(|c| self.doc.get(c))
            .map(|n| Localized {
                lang: n.attribute(ns::XML, "lang").unwrap_or(""),
                value: n.text().unwrap_or(""),
            })
            .collect()
    }
}

impl<'d> Endpoint<'d> {
    pub fn kind(&self) -> Option<ElementKind> {
        self.node().kind()
    }

    pub fn binding(&self) -> Option<&'d str> {
        self.attr(ns::attr::BINDING)
    }

    pub fn location(&self) -> Option<&'d str> {
        self.attr(ns::attr::LOCATION)
    }

    pub fn response_location(&self) -> Option<&'d str> {
        self.attr("ResponseLocation")
    }

    pub fn index(&self) -> Option<u16> {
        self.attr("index").and_then(|v| v.trim().parse().ok())
    }

    pub fn is_default(&self) -> Option<bool> {
        self.attr("isDefault").and_then(parse_boolean)
    }
}
