#![forbid(unsafe_code)]

//! The closed set of built-in element kinds.

use ulriksdal_core::{ns, QName};

macro_rules! element_kinds {
    ($( $variant:ident => ($ns:expr, $prefix:expr, $local:literal) ),* $(,)?) => {
        /// One tag per built-in qualified element name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ElementKind {
            $($variant),*
        }

        impl ElementKind {
            pub const ALL: &'static [ElementKind] = &[$(ElementKind::$variant),*];

            pub const fn qname(self) -> QName {
                match self {
                    $(ElementKind::$variant => QName::from_static($ns, $local, Some($prefix))),*
                }
            }

            pub const fn local_name(self) -> &'static str {
                match self {
                    $(ElementKind::$variant => $local),*
                }
            }

            pub const fn namespace(self) -> &'static str {
                match self {
                    $(ElementKind::$variant => $ns),*
                }
            }
        }
    };
}

element_kinds! {
    // SAML 2.0 metadata
    EntitiesDescriptor => (ns::MD, ns::prefix::MD, "EntitiesDescriptor"),
    EntityDescriptor => (ns::MD, ns::prefix::MD, "EntityDescriptor"),
    IdpSsoDescriptor => (ns::MD, ns::prefix::MD, "IDPSSODescriptor"),
    SpSsoDescriptor => (ns::MD, ns::prefix::MD, "SPSSODescriptor"),
    AttributeAuthorityDescriptor => (ns::MD, ns::prefix::MD, "AttributeAuthorityDescriptor"),
    KeyDescriptor => (ns::MD, ns::prefix::MD, "KeyDescriptor"),
    EncryptionMethod => (ns::MD, ns::prefix::MD, "EncryptionMethod"),
    Organization => (ns::MD, ns::prefix::MD, "Organization"),
    OrganizationName => (ns::MD, ns::prefix::MD, "OrganizationName"),
    OrganizationDisplayName => (ns::MD, ns::prefix::MD, "OrganizationDisplayName"),
    OrganizationUrl => (ns::MD, ns::prefix::MD, "OrganizationURL"),
    ContactPerson => (ns::MD, ns::prefix::MD, "ContactPerson"),
    Company => (ns::MD, ns::prefix::MD, "Company"),
    GivenName => (ns::MD, ns::prefix::MD, "GivenName"),
    SurName => (ns::MD, ns::prefix::MD, "SurName"),
    EmailAddress => (ns::MD, ns::prefix::MD, "EmailAddress"),
    TelephoneNumber => (ns::MD, ns::prefix::MD, "TelephoneNumber"),
    SingleSignOnService => (ns::MD, ns::prefix::MD, "SingleSignOnService"),
    SingleLogoutService => (ns::MD, ns::prefix::MD, "SingleLogoutService"),
    ArtifactResolutionService => (ns::MD, ns::prefix::MD, "ArtifactResolutionService"),
    AssertionConsumerService => (ns::MD, ns::prefix::MD, "AssertionConsumerService"),
    AttributeService => (ns::MD, ns::prefix::MD, "AttributeService"),
    NameIdFormat => (ns::MD, ns::prefix::MD, "NameIDFormat"),

    // SAML 2.0 assertions
    Assertion => (ns::SAML2, ns::prefix::SAML2, "Assertion"),
    Issuer => (ns::SAML2, ns::prefix::SAML2, "Issuer"),
    NameId => (ns::SAML2, ns::prefix::SAML2, "NameID"),
    Subject => (ns::SAML2, ns::prefix::SAML2, "Subject"),
    SubjectConfirmation => (ns::SAML2, ns::prefix::SAML2, "SubjectConfirmation"),
    SubjectConfirmationData => (ns::SAML2, ns::prefix::SAML2, "SubjectConfirmationData"),
    Conditions => (ns::SAML2, ns::prefix::SAML2, "Conditions"),
    AudienceRestriction => (ns::SAML2, ns::prefix::SAML2, "AudienceRestriction"),
    Audience => (ns::SAML2, ns::prefix::SAML2, "Audience"),
    AuthnStatement => (ns::SAML2, ns::prefix::SAML2, "AuthnStatement"),
    AuthnContext => (ns::SAML2, ns::prefix::SAML2, "AuthnContext"),
    AuthnContextClassRef => (ns::SAML2, ns::prefix::SAML2, "AuthnContextClassRef"),
    AuthnContextDeclRef => (ns::SAML2, ns::prefix::SAML2, "AuthnContextDeclRef"),
    AttributeStatement => (ns::SAML2, ns::prefix::SAML2, "AttributeStatement"),
    Attribute => (ns::SAML2, ns::prefix::SAML2, "Attribute"),
    AttributeValue => (ns::SAML2, ns::prefix::SAML2, "AttributeValue"),
    AssertionIdRef => (ns::SAML2, ns::prefix::SAML2, "AssertionIDRef"),

    // SAML 2.0 protocol
    Response => (ns::SAML2P, ns::prefix::SAML2P, "Response"),
    Status => (ns::SAML2P, ns::prefix::SAML2P, "Status"),
    StatusCode => (ns::SAML2P, ns::prefix::SAML2P, "StatusCode"),
    StatusMessage => (ns::SAML2P, ns::prefix::SAML2P, "StatusMessage"),
    AuthnQuery => (ns::SAML2P, ns::prefix::SAML2P, "AuthnQuery"),
    RequestedAuthnContext => (ns::SAML2P, ns::prefix::SAML2P, "RequestedAuthnContext"),
    AttributeQuery => (ns::SAML2P, ns::prefix::SAML2P, "AttributeQuery"),
    NameIdMappingResponse => (ns::SAML2P, ns::prefix::SAML2P, "NameIDMappingResponse"),
    IdpList => (ns::SAML2P, ns::prefix::SAML2P, "IDPList"),
    IdpEntry => (ns::SAML2P, ns::prefix::SAML2P, "IDPEntry"),
    GetComplete => (ns::SAML2P, ns::prefix::SAML2P, "GetComplete"),

    // SAML 1.x assertions
    Saml1Subject => (ns::SAML1, ns::prefix::SAML1, "Subject"),
    Saml1NameIdentifier => (ns::SAML1, ns::prefix::SAML1, "NameIdentifier"),
    Saml1SubjectConfirmation => (ns::SAML1, ns::prefix::SAML1, "SubjectConfirmation"),
    Saml1ConfirmationMethod => (ns::SAML1, ns::prefix::SAML1, "ConfirmationMethod"),
    Saml1SubjectConfirmationData => (ns::SAML1, ns::prefix::SAML1, "SubjectConfirmationData"),
    Saml1AuthorizationDecisionStatement => (ns::SAML1, ns::prefix::SAML1, "AuthorizationDecisionStatement"),
    Saml1Action => (ns::SAML1, ns::prefix::SAML1, "Action"),
    Saml1AttributeDesignator => (ns::SAML1, ns::prefix::SAML1, "AttributeDesignator"),

    // SAML 1.x protocol
    Saml1AttributeQuery => (ns::SAML1P, ns::prefix::SAML1P, "AttributeQuery"),
    Saml1Status => (ns::SAML1P, ns::prefix::SAML1P, "Status"),
    Saml1StatusCode => (ns::SAML1P, ns::prefix::SAML1P, "StatusCode"),
    Saml1StatusMessage => (ns::SAML1P, ns::prefix::SAML1P, "StatusMessage"),

    // XML-DSig key material
    KeyInfo => (ns::DSIG, ns::prefix::DSIG, "KeyInfo"),
    KeyName => (ns::DSIG, ns::prefix::DSIG, "KeyName"),
    KeyValue => (ns::DSIG, ns::prefix::DSIG, "KeyValue"),
    RsaKeyValue => (ns::DSIG, ns::prefix::DSIG, "RSAKeyValue"),
    Modulus => (ns::DSIG, ns::prefix::DSIG, "Modulus"),
    Exponent => (ns::DSIG, ns::prefix::DSIG, "Exponent"),
    X509Data => (ns::DSIG, ns::prefix::DSIG, "X509Data"),
    X509Certificate => (ns::DSIG, ns::prefix::DSIG, "X509Certificate"),

    // XML Encryption
    KeySize => (ns::XENC, ns::prefix::XENC, "KeySize"),
}

impl ElementKind {
    /// The built-in kind for a qualified name, if any.
    pub fn from_qname(name: &QName) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| name.is(k.namespace(), k.local_name()))
    }

    /// Metadata role descriptors (the concrete `md:RoleDescriptor` subtypes).
    pub fn is_role_descriptor(self) -> bool {
        matches!(
            self,
            Self::IdpSsoDescriptor | Self::SpSsoDescriptor | Self::AttributeAuthorityDescriptor
        )
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_qnames_are_unique() {
        let names: HashSet<QName> = ElementKind::ALL.iter().map(|k| k.qname()).collect();
        assert_eq!(names.len(), ElementKind::ALL.len());
    }

    #[test]
    fn test_from_qname() {
        let q = QName::new(ns::SAML1P, "Status");
        assert_eq!(ElementKind::from_qname(&q), Some(ElementKind::Saml1Status));
        let q = QName::new(ns::SAML2P, "Status");
        assert_eq!(ElementKind::from_qname(&q), Some(ElementKind::Status));
        assert_eq!(ElementKind::from_qname(&QName::new("urn:x", "Status")), None);
    }

    #[test]
    fn test_role_descriptors() {
        assert!(ElementKind::SpSsoDescriptor.is_role_descriptor());
        assert!(!ElementKind::EntityDescriptor.is_role_descriptor());
    }
}
