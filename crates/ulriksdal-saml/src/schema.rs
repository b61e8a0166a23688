#![forbid(unsafe_code)]

//! Bindings for the built-in element types and the default registry.

use std::sync::Arc;

use crate::binding::{AttributeSpec as A, ChildSpec as C, ElementBinding, ValueType as V};
use crate::kind::ElementKind as K;
use crate::registry::{TypeRegistry, TypeRegistryBuilder};
use crate::validators;
use ulriksdal_core::Result;

// ── Shared attribute groups ──────────────────────────────────────────

const NAME_ID_ATTRIBUTES: &[A] = &[
    A::optional("NameQualifier", V::String),
    A::optional("SPNameQualifier", V::String),
    A::optional("Format", V::AnyUri),
    A::optional("SPProvidedID", V::String),
];

const REQUEST_ATTRIBUTES: &[A] = &[
    A::required("ID", V::Id),
    A::required("Version", V::String),
    A::required("IssueInstant", V::DateTime),
    A::optional("Destination", V::AnyUri),
    A::optional("Consent", V::AnyUri),
];

const STATUS_RESPONSE_ATTRIBUTES: &[A] = &[
    A::required("ID", V::Id),
    A::optional("InResponseTo", V::String),
    A::required("Version", V::String),
    A::required("IssueInstant", V::DateTime),
    A::optional("Destination", V::AnyUri),
    A::optional("Consent", V::AnyUri),
];

const ROLE_ATTRIBUTES: &[A] = &[
    A::optional("ID", V::Id),
    A::optional("validUntil", V::DateTime),
    A::optional("cacheDuration", V::String),
    A::required("protocolSupportEnumeration", V::ProtocolList),
    A::optional("errorURL", V::AnyUri),
];

const ENDPOINT_ATTRIBUTES: &[A] = &[
    A::required("Binding", V::AnyUri),
    A::required("Location", V::AnyUri),
    A::optional("ResponseLocation", V::AnyUri),
];

const INDEXED_ENDPOINT_ATTRIBUTES: &[A] = &[
    A::required("Binding", V::AnyUri),
    A::required("Location", V::AnyUri),
    A::optional("ResponseLocation", V::AnyUri),
    A::required("index", V::UnsignedShort),
    A::optional("isDefault", V::Boolean),
];

const LOCALIZED: &[A] = &[A::xml_lang(true)];

// ── SAML 2.0 metadata ────────────────────────────────────────────────

pub static ENTITIES_DESCRIPTOR: ElementBinding = ElementBinding {
    attributes: &[
        A::optional("ID", V::Id),
        A::optional("validUntil", V::DateTime),
        A::optional("cacheDuration", V::String),
        A::optional("Name", V::String),
    ],
    children: &[C::many(K::EntitiesDescriptor), C::many(K::EntityDescriptor)],
    ..ElementBinding::elements(K::EntitiesDescriptor).signable("ID")
};

pub static ENTITY_DESCRIPTOR: ElementBinding = ElementBinding {
    attributes: &[
        A::required("entityID", V::AnyUri),
        A::optional("ID", V::Id),
        A::optional("validUntil", V::DateTime),
        A::optional("cacheDuration", V::String),
    ],
    children: &[
        C::many(K::IdpSsoDescriptor),
        C::many(K::SpSsoDescriptor),
        C::many(K::AttributeAuthorityDescriptor),
        C::optional(K::Organization),
        C::many(K::ContactPerson),
    ],
    ..ElementBinding::elements(K::EntityDescriptor)
        .signable("ID")
        .any_attribute()
};

pub static IDP_SSO_DESCRIPTOR: ElementBinding = ElementBinding {
    attributes: &[
        A::optional("ID", V::Id),
        A::optional("validUntil", V::DateTime),
        A::optional("cacheDuration", V::String),
        A::required("protocolSupportEnumeration", V::ProtocolList),
        A::optional("errorURL", V::AnyUri),
        A::optional("WantAuthnRequestsSigned", V::Boolean),
    ],
    children: &[
        C::many(K::KeyDescriptor),
        C::optional(K::Organization),
        C::many(K::ContactPerson),
        C::many(K::ArtifactResolutionService),
        C::many(K::SingleLogoutService),
        C::many(K::NameIdFormat),
        C::at_least_one(K::SingleSignOnService),
        C::many(K::Attribute),
    ],
    ..ElementBinding::elements(K::IdpSsoDescriptor)
        .signable("ID")
        .any_attribute()
};

pub static SP_SSO_DESCRIPTOR: ElementBinding = ElementBinding {
    attributes: &[
        A::optional("ID", V::Id),
        A::optional("validUntil", V::DateTime),
        A::optional("cacheDuration", V::String),
        A::required("protocolSupportEnumeration", V::ProtocolList),
        A::optional("errorURL", V::AnyUri),
        A::optional("AuthnRequestsSigned", V::Boolean),
        A::optional("WantAssertionsSigned", V::Boolean),
    ],
    children: &[
        C::many(K::KeyDescriptor),
        C::optional(K::Organization),
        C::many(K::ContactPerson),
        C::many(K::ArtifactResolutionService),
        C::many(K::SingleLogoutService),
        C::many(K::NameIdFormat),
        C::at_least_one(K::AssertionConsumerService),
    ],
    ..ElementBinding::elements(K::SpSsoDescriptor)
        .signable("ID")
        .any_attribute()
};

pub static ATTRIBUTE_AUTHORITY_DESCRIPTOR: ElementBinding = ElementBinding {
    attributes: ROLE_ATTRIBUTES,
    children: &[
        C::many(K::KeyDescriptor),
        C::optional(K::Organization),
        C::many(K::ContactPerson),
        C::at_least_one(K::AttributeService),
        C::many(K::NameIdFormat),
        C::many(K::Attribute),
    ],
    ..ElementBinding::elements(K::AttributeAuthorityDescriptor)
        .signable("ID")
        .any_attribute()
};

pub static KEY_DESCRIPTOR: ElementBinding = ElementBinding {
    attributes: &[A::optional("use", V::KeyUse)],
    children: &[C::one(K::KeyInfo), C::many(K::EncryptionMethod)],
    ..ElementBinding::elements(K::KeyDescriptor)
};

pub static ENCRYPTION_METHOD: ElementBinding = ElementBinding {
    attributes: &[A::required("Algorithm", V::AnyUri)],
    children: &[C::optional(K::KeySize)],
    ..ElementBinding::elements(K::EncryptionMethod)
};

pub static ORGANIZATION: ElementBinding = ElementBinding {
    children: &[
        C::at_least_one(K::OrganizationName),
        C::at_least_one(K::OrganizationDisplayName),
        C::at_least_one(K::OrganizationUrl),
    ],
    ..ElementBinding::elements(K::Organization).any_attribute()
};

pub static ORGANIZATION_NAME: ElementBinding = ElementBinding {
    attributes: LOCALIZED,
    ..ElementBinding::text(K::OrganizationName)
};

pub static ORGANIZATION_DISPLAY_NAME: ElementBinding = ElementBinding {
    attributes: LOCALIZED,
    ..ElementBinding::text(K::OrganizationDisplayName)
};

pub static ORGANIZATION_URL: ElementBinding = ElementBinding {
    attributes: LOCALIZED,
    ..ElementBinding::text(K::OrganizationUrl)
};

pub static CONTACT_PERSON: ElementBinding = ElementBinding {
    attributes: &[A::required(
        "contactType",
        V::Enumerated(&["technical", "support", "administrative", "billing", "other"]),
    )],
    children: &[
        C::optional(K::Company),
        C::optional(K::GivenName),
        C::optional(K::SurName),
        C::many(K::EmailAddress),
        C::many(K::TelephoneNumber),
    ],
    ..ElementBinding::elements(K::ContactPerson).any_attribute()
};

pub static COMPANY: ElementBinding = ElementBinding::text(K::Company);
pub static GIVEN_NAME: ElementBinding = ElementBinding::text(K::GivenName);
pub static SUR_NAME: ElementBinding = ElementBinding::text(K::SurName);
pub static EMAIL_ADDRESS: ElementBinding = ElementBinding::text(K::EmailAddress);
pub static TELEPHONE_NUMBER: ElementBinding = ElementBinding::text(K::TelephoneNumber);
pub static NAME_ID_FORMAT: ElementBinding = ElementBinding::text(K::NameIdFormat);

pub static SINGLE_SIGN_ON_SERVICE: ElementBinding = ElementBinding {
    attributes: ENDPOINT_ATTRIBUTES,
    ..ElementBinding::elements(K::SingleSignOnService).any_attribute()
};

pub static SINGLE_LOGOUT_SERVICE: ElementBinding = ElementBinding {
    attributes: ENDPOINT_ATTRIBUTES,
    ..ElementBinding::elements(K::SingleLogoutService).any_attribute()
};

pub static ATTRIBUTE_SERVICE: ElementBinding = ElementBinding {
    attributes: ENDPOINT_ATTRIBUTES,
    ..ElementBinding::elements(K::AttributeService).any_attribute()
};

pub static ARTIFACT_RESOLUTION_SERVICE: ElementBinding = ElementBinding {
    attributes: INDEXED_ENDPOINT_ATTRIBUTES,
    ..ElementBinding::elements(K::ArtifactResolutionService).any_attribute()
};

pub static ASSERTION_CONSUMER_SERVICE: ElementBinding = ElementBinding {
    attributes: INDEXED_ENDPOINT_ATTRIBUTES,
    ..ElementBinding::elements(K::AssertionConsumerService).any_attribute()
};

// ── SAML 2.0 assertions ──────────────────────────────────────────────

pub static ASSERTION: ElementBinding = ElementBinding {
    attributes: &[
        A::required("ID", V::Id),
        A::required("Version", V::String),
        A::required("IssueInstant", V::DateTime),
    ],
    children: &[
        C::one(K::Issuer),
        C::optional(K::Subject),
        C::optional(K::Conditions),
        C::many(K::AuthnStatement),
        C::many(K::AttributeStatement),
    ],
    ..ElementBinding::elements(K::Assertion).signable("ID")
};

pub static ISSUER: ElementBinding = ElementBinding {
    attributes: NAME_ID_ATTRIBUTES,
    ..ElementBinding::text(K::Issuer)
};

pub static NAME_ID: ElementBinding = ElementBinding {
    attributes: NAME_ID_ATTRIBUTES,
    ..ElementBinding::text(K::NameId)
};

pub static SUBJECT: ElementBinding = ElementBinding {
    children: &[C::optional(K::NameId), C::many(K::SubjectConfirmation)],
    ..ElementBinding::elements(K::Subject)
};

pub static SUBJECT_CONFIRMATION: ElementBinding = ElementBinding {
    attributes: &[A::required("Method", V::AnyUri)],
    children: &[C::optional(K::NameId), C::optional(K::SubjectConfirmationData)],
    ..ElementBinding::elements(K::SubjectConfirmation)
};

pub static SUBJECT_CONFIRMATION_DATA: ElementBinding = ElementBinding {
    attributes: &[
        A::optional("NotBefore", V::DateTime),
        A::optional("NotOnOrAfter", V::DateTime),
        A::optional("Recipient", V::AnyUri),
        A::optional("InResponseTo", V::String),
        A::optional("Address", V::String),
    ],
    children: &[C::many(K::KeyInfo)],
    ..ElementBinding::mixed(K::SubjectConfirmationData).any_attribute()
};

pub static CONDITIONS: ElementBinding = ElementBinding {
    attributes: &[
        A::optional("NotBefore", V::DateTime),
        A::optional("NotOnOrAfter", V::DateTime),
    ],
    children: &[C::many(K::AudienceRestriction)],
    ..ElementBinding::elements(K::Conditions)
};

pub static AUDIENCE_RESTRICTION: ElementBinding = ElementBinding {
    children: &[C::at_least_one(K::Audience)],
    ..ElementBinding::elements(K::AudienceRestriction)
};

pub static AUDIENCE: ElementBinding = ElementBinding::text(K::Audience);

pub static AUTHN_STATEMENT: ElementBinding = ElementBinding {
    attributes: &[
        A::required("AuthnInstant", V::DateTime),
        A::optional("SessionIndex", V::String),
        A::optional("SessionNotOnOrAfter", V::DateTime),
    ],
    children: &[C::one(K::AuthnContext)],
    ..ElementBinding::elements(K::AuthnStatement)
};

pub static AUTHN_CONTEXT: ElementBinding = ElementBinding {
    children: &[
        C::optional(K::AuthnContextClassRef),
        C::optional(K::AuthnContextDeclRef),
    ],
    ..ElementBinding::elements(K::AuthnContext)
};

pub static AUTHN_CONTEXT_CLASS_REF: ElementBinding = ElementBinding::text(K::AuthnContextClassRef);

pub static AUTHN_CONTEXT_DECL_REF: ElementBinding = ElementBinding::text(K::AuthnContextDeclRef);

pub static ATTRIBUTE_STATEMENT: ElementBinding = ElementBinding {
    children: &[C::at_least_one(K::Attribute)],
    ..ElementBinding::elements(K::AttributeStatement)
};

pub static ATTRIBUTE: ElementBinding = ElementBinding {
    attributes: &[
        A::required("Name", V::String),
        A::optional("NameFormat", V::AnyUri),
        A::optional("FriendlyName", V::String),
    ],
    children: &[C::many(K::AttributeValue)],
    ..ElementBinding::elements(K::Attribute).any_attribute()
};

pub static ATTRIBUTE_VALUE: ElementBinding = ElementBinding::mixed(K::AttributeValue);

pub static ASSERTION_ID_REF: ElementBinding = ElementBinding::text(K::AssertionIdRef);

// ── SAML 2.0 protocol ────────────────────────────────────────────────

pub static RESPONSE: ElementBinding = ElementBinding {
    attributes: STATUS_RESPONSE_ATTRIBUTES,
    children: &[
        C::optional(K::Issuer),
        C::one(K::Status),
        C::many(K::Assertion),
    ],
    ..ElementBinding::elements(K::Response).signable("ID")
};

pub static STATUS: ElementBinding = ElementBinding {
    children: &[C::one(K::StatusCode), C::optional(K::StatusMessage)],
    ..ElementBinding::elements(K::Status)
};

pub static STATUS_CODE: ElementBinding = ElementBinding {
    attributes: &[A::required("Value", V::AnyUri)],
    children: &[C::optional(K::StatusCode)],
    ..ElementBinding::elements(K::StatusCode)
};

pub static STATUS_MESSAGE: ElementBinding = ElementBinding::text(K::StatusMessage);

pub static AUTHN_QUERY: ElementBinding = ElementBinding {
    attributes: &[
        A::required("ID", V::Id),
        A::required("Version", V::String),
        A::required("IssueInstant", V::DateTime),
        A::optional("Destination", V::AnyUri),
        A::optional("Consent", V::AnyUri),
        A::optional("SessionIndex", V::String),
    ],
    children: &[
        C::optional(K::Issuer),
        C::one(K::Subject),
        C::optional(K::RequestedAuthnContext),
    ],
    ..ElementBinding::elements(K::AuthnQuery).signable("ID")
};

pub static REQUESTED_AUTHN_CONTEXT: ElementBinding = ElementBinding {
    attributes: &[A::optional(
        "Comparison",
        V::Enumerated(&["exact", "minimum", "maximum", "better"]),
    )],
    children: &[
        C::many(K::AuthnContextClassRef),
        C::many(K::AuthnContextDeclRef),
    ],
    ..ElementBinding::elements(K::RequestedAuthnContext)
};

pub static ATTRIBUTE_QUERY: ElementBinding = ElementBinding {
    attributes: REQUEST_ATTRIBUTES,
    children: &[
        C::optional(K::Issuer),
        C::one(K::Subject),
        C::many(K::Attribute),
    ],
    ..ElementBinding::elements(K::AttributeQuery).signable("ID")
};

pub static NAME_ID_MAPPING_RESPONSE: ElementBinding = ElementBinding {
    attributes: STATUS_RESPONSE_ATTRIBUTES,
    children: &[
        C::optional(K::Issuer),
        C::one(K::Status),
        C::one(K::NameId),
    ],
    ..ElementBinding::elements(K::NameIdMappingResponse).signable("ID")
};

pub static IDP_LIST: ElementBinding = ElementBinding {
    children: &[C::at_least_one(K::IdpEntry), C::optional(K::GetComplete)],
    ..ElementBinding::elements(K::IdpList)
};

pub static IDP_ENTRY: ElementBinding = ElementBinding {
    attributes: &[
        A::required("ProviderID", V::AnyUri),
        A::optional("Name", V::String),
        A::optional("Loc", V::AnyUri),
    ],
    ..ElementBinding::elements(K::IdpEntry)
};

pub static GET_COMPLETE: ElementBinding = ElementBinding::text(K::GetComplete);

// ── SAML 1.x ─────────────────────────────────────────────────────────

pub static SAML1_SUBJECT: ElementBinding = ElementBinding {
    children: &[
        C::optional(K::Saml1NameIdentifier),
        C::optional(K::Saml1SubjectConfirmation),
    ],
    ..ElementBinding::elements(K::Saml1Subject)
};

pub static SAML1_NAME_IDENTIFIER: ElementBinding = ElementBinding {
    attributes: &[
        A::optional("NameQualifier", V::String),
        A::optional("Format", V::AnyUri),
    ],
    ..ElementBinding::text(K::Saml1NameIdentifier)
};

pub static SAML1_SUBJECT_CONFIRMATION: ElementBinding = ElementBinding {
    children: &[
        C::at_least_one(K::Saml1ConfirmationMethod),
        C::optional(K::Saml1SubjectConfirmationData),
        C::optional(K::KeyInfo),
    ],
    ..ElementBinding::elements(K::Saml1SubjectConfirmation)
};

pub static SAML1_CONFIRMATION_METHOD: ElementBinding =
    ElementBinding::text(K::Saml1ConfirmationMethod);

pub static SAML1_SUBJECT_CONFIRMATION_DATA: ElementBinding =
    ElementBinding::mixed(K::Saml1SubjectConfirmationData);

pub static SAML1_AUTHORIZATION_DECISION_STATEMENT: ElementBinding = ElementBinding {
    attributes: &[
        A::required("Resource", V::AnyUri),
        A::required("Decision", V::Enumerated(&["Permit", "Deny", "Indeterminate"])),
    ],
    children: &[C::one(K::Saml1Subject), C::at_least_one(K::Saml1Action)],
    ..ElementBinding::elements(K::Saml1AuthorizationDecisionStatement)
};

pub static SAML1_ACTION: ElementBinding = ElementBinding {
    attributes: &[A::optional("Namespace", V::AnyUri)],
    ..ElementBinding::text(K::Saml1Action)
};

pub static SAML1_ATTRIBUTE_DESIGNATOR: ElementBinding = ElementBinding {
    attributes: &[
        A::required("AttributeName", V::String),
        A::required("AttributeNamespace", V::AnyUri),
    ],
    ..ElementBinding::elements(K::Saml1AttributeDesignator)
};

pub static SAML1_ATTRIBUTE_QUERY: ElementBinding = ElementBinding {
    attributes: &[A::optional("Resource", V::AnyUri)],
    children: &[C::one(K::Saml1Subject), C::many(K::Saml1AttributeDesignator)],
    ..ElementBinding::elements(K::Saml1AttributeQuery)
};

pub static SAML1_STATUS: ElementBinding = ElementBinding {
    children: &[C::one(K::Saml1StatusCode), C::optional(K::Saml1StatusMessage)],
    ..ElementBinding::elements(K::Saml1Status)
};

pub static SAML1_STATUS_CODE: ElementBinding = ElementBinding {
    attributes: &[A::required("Value", V::String)],
    children: &[C::optional(K::Saml1StatusCode)],
    ..ElementBinding::elements(K::Saml1StatusCode)
};

pub static SAML1_STATUS_MESSAGE: ElementBinding = ElementBinding::text(K::Saml1StatusMessage);

// ── XML-DSig / XML-Enc key material ──────────────────────────────────

pub static KEY_INFO: ElementBinding = ElementBinding {
    attributes: &[A::optional("Id", V::String)],
    children: &[
        C::many(K::KeyName),
        C::many(K::KeyValue),
        C::many(K::X509Data),
    ],
    ..ElementBinding::elements(K::KeyInfo)
};

pub static KEY_NAME: ElementBinding = ElementBinding::text(K::KeyName);

pub static KEY_VALUE: ElementBinding = ElementBinding {
    children: &[C::one(K::RsaKeyValue)],
    ..ElementBinding::elements(K::KeyValue)
};

pub static RSA_KEY_VALUE: ElementBinding = ElementBinding {
    children: &[C::one(K::Modulus), C::one(K::Exponent)],
    ..ElementBinding::elements(K::RsaKeyValue)
};

pub static MODULUS: ElementBinding = ElementBinding::text(K::Modulus);
pub static EXPONENT: ElementBinding = ElementBinding::text(K::Exponent);

pub static X509_DATA: ElementBinding = ElementBinding {
    children: &[C::at_least_one(K::X509Certificate)],
    ..ElementBinding::elements(K::X509Data)
};

pub static X509_CERTIFICATE: ElementBinding = ElementBinding::text(K::X509Certificate);

pub static KEY_SIZE: ElementBinding = ElementBinding::text(K::KeySize);

/// Every built-in binding.
pub static BINDINGS: &[&ElementBinding] = &[
    &ENTITIES_DESCRIPTOR,
    &ENTITY_DESCRIPTOR,
    &IDP_SSO_DESCRIPTOR,
    &SP_SSO_DESCRIPTOR,
    &ATTRIBUTE_AUTHORITY_DESCRIPTOR,
    &KEY_DESCRIPTOR,
    &ENCRYPTION_METHOD,
    &ORGANIZATION,
    &ORGANIZATION_NAME,
    &ORGANIZATION_DISPLAY_NAME,
    &ORGANIZATION_URL,
    &CONTACT_PERSON,
    &COMPANY,
    &GIVEN_NAME,
    &SUR_NAME,
    &EMAIL_ADDRESS,
    &TELEPHONE_NUMBER,
    &SINGLE_SIGN_ON_SERVICE,
    &SINGLE_LOGOUT_SERVICE,
    &ARTIFACT_RESOLUTION_SERVICE,
    &ASSERTION_CONSUMER_SERVICE,
    &ATTRIBUTE_SERVICE,
    &NAME_ID_FORMAT,
    &ASSERTION,
    &ISSUER,
    &NAME_ID,
    &SUBJECT,
    &SUBJECT_CONFIRMATION,
    &SUBJECT_CONFIRMATION_DATA,
    &CONDITIONS,
    &AUDIENCE_RESTRICTION,
    &AUDIENCE,
    &AUTHN_STATEMENT,
    &AUTHN_CONTEXT,
    &AUTHN_CONTEXT_CLASS_REF,
    &AUTHN_CONTEXT_DECL_REF,
    &ATTRIBUTE_STATEMENT,
    &ATTRIBUTE,
    &ATTRIBUTE_VALUE,
    &ASSERTION_ID_REF,
    &RESPONSE,
    &STATUS,
    &STATUS_CODE,
    &STATUS_MESSAGE,
    &AUTHN_QUERY,
    &REQUESTED_AUTHN_CONTEXT,
    &ATTRIBUTE_QUERY,
    &NAME_ID_MAPPING_RESPONSE,
    &IDP_LIST,
    &IDP_ENTRY,
    &GET_COMPLETE,
    &SAML1_SUBJECT,
    &SAML1_NAME_IDENTIFIER,
    &SAML1_SUBJECT_CONFIRMATION,
    &SAML1_CONFIRMATION_METHOD,
    &SAML1_SUBJECT_CONFIRMATION_DATA,
    &SAML1_AUTHORIZATION_DECISION_STATEMENT,
    &SAML1_ACTION,
    &SAML1_ATTRIBUTE_DESIGNATOR,
    &SAML1_ATTRIBUTE_QUERY,
    &SAML1_STATUS,
    &SAML1_STATUS_CODE,
    &SAML1_STATUS_MESSAGE,
    &KEY_INFO,
    &KEY_NAME,
    &KEY_VALUE,
    &RSA_KEY_VALUE,
    &MODULUS,
    &EXPONENT,
    &X509_DATA,
    &X509_CERTIFICATE,
    &KEY_SIZE,
];

/// Register every built-in type and its schema validators.
pub fn register_defaults(builder: &mut TypeRegistryBuilder) -> Result<()> {
    for binding in BINDINGS {
        builder.register_binding(*binding)?;
    }

    for kind in [K::IdpSsoDescriptor, K::SpSsoDescriptor, K::AttributeAuthorityDescriptor] {
        builder.add_validator(&kind.qname(), Arc::new(validators::ProtocolSupport))?;
    }
    for kind in [
        K::Assertion,
        K::Response,
        K::AuthnQuery,
        K::AttributeQuery,
        K::NameIdMappingResponse,
    ] {
        builder.add_validator(&kind.qname(), Arc::new(validators::SamlVersion))?;
    }
    builder.add_validator(&K::EntityDescriptor.qname(), Arc::new(validators::ENTITY_HAS_ROLE))?;
    builder.add_validator(
        &K::EntitiesDescriptor.qname(),
        Arc::new(validators::ENTITIES_NOT_EMPTY),
    )?;
    builder.add_validator(&K::Subject.qname(), Arc::new(validators::SUBJECT_IDENTIFIED))?;
    builder.add_validator(
        &K::Saml1Subject.qname(),
        Arc::new(validators::SAML1_SUBJECT_IDENTIFIED),
    )?;
    let requested = K::RequestedAuthnContext.qname();
    builder.add_validator(&requested, Arc::new(validators::AUTHN_CONTEXT_REQUESTED))?;
    builder.add_validator(&requested, Arc::new(validators::AUTHN_CONTEXT_CHOICE))?;
    builder.add_validator(&K::Conditions.qname(), Arc::new(validators::ValidityWindow))?;
    builder.add_validator(
        &K::SubjectConfirmationData.qname(),
        Arc::new(validators::ValidityWindow),
    )?;
    builder.add_validator(&K::Status.qname(), Arc::new(validators::TopLevelStatusCode))?;
    Ok(())
}

/// A registry holding every built-in type.
///
/// Fails only if the built-in tables name a type twice or attach a
/// validator to an unbound type.
pub fn default_registry() -> Result<TypeRegistry> {
    let mut builder = TypeRegistry::builder();
    register_defaults(&mut builder)?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ElementKind;
    use ulriksdal_core::Error;

    #[test]
    fn test_every_kind_is_bound_once() {
        let mut builder = TypeRegistry::builder();
        register_defaults(&mut builder).unwrap();
        let registry = builder.build();
        assert_eq!(registry.len(), ElementKind::ALL.len());
        for kind in ElementKind::ALL {
            assert!(registry.contains(&kind.qname()), "{kind} is not registered");
        }
    }

    #[test]
    fn test_duplicate_defaults_fail() {
        let mut builder = TypeRegistry::builder();
        register_defaults(&mut builder).unwrap();
        let err = register_defaults(&mut builder).unwrap_err();
        assert!(matches!(err, Error::DuplicateRegistration(_)), "{err:?}");
    }

    #[test]
    fn test_signable_types_have_id() {
        for binding in BINDINGS {
            if binding.signable {
                assert!(binding.id_attribute.is_some(), "{} lacks an ID", binding.kind);
            }
        }
    }

    #[test]
    fn test_child_kinds_are_registered() {
        let registry = default_registry().unwrap();
        for binding in BINDINGS {
            for child in binding.children {
                assert!(registry.contains(&child.kind.qname()));
            }
        }
    }
}
