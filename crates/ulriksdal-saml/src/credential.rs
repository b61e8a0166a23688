#![forbid(unsafe_code)]

//! Credential context resolution.
//!
//! A key found in metadata means something only together with where it was
//! found: `ds:KeyInfo` → `md:KeyDescriptor` (usage, encryption methods) →
//! role descriptor (protocols) → optional `md:EntityDescriptor`. The context
//! is rebuilt on demand by walking parent links.

use crate::document::{Document, NodeId};
use crate::kind::ElementKind;
use ulriksdal_core::{ns, Error, Result};
use ulriksdal_keys::keyinfo::{key_from_rsa_key_value, key_from_x509_certificate};
use ulriksdal_keys::{Key, KeyUsage};

/// The declared `use` of a key descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialUsage {
    Signing,
    Encryption,
    /// No `use` attribute: the key serves both purposes.
    Unspecified,
}

impl CredentialUsage {
    pub fn from_use(value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(Self::Unspecified),
            Some("signing") => Ok(Self::Signing),
            Some("encryption") => Ok(Self::Encryption),
            Some(other) => Err(Error::UnknownUsage(other.to_owned())),
        }
    }

    /// Whether a credential with this usage may serve `wanted`.
    pub fn permits(self, wanted: CredentialUsage) -> bool {
        self == Self::Unspecified || wanted == Self::Unspecified || self == wanted
    }

    pub fn key_usage(self) -> KeyUsage {
        match self {
            Self::Signing => KeyUsage::Signing,
            Self::Encryption => KeyUsage::Encryption,
            Self::Unspecified => KeyUsage::Any,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialContext {
    pub key_info: NodeId,
    pub key_descriptor: NodeId,
    pub role: NodeId,
    pub role_kind: ElementKind,
    /// `entityID` of the owning entity, when the role is attached to one.
    pub entity_id: Option<String>,
    pub usage: CredentialUsage,
    /// `md:EncryptionMethod/@Algorithm` values, in document order.
    pub encryption_methods: Vec<String>,
    pub protocols: Vec<String>,
}

/// A key together with the metadata scope it was found in.
#[derive(Debug, Clone)]
pub struct Credential {
    pub key: Key,
    pub context: CredentialContext,
}

/// Walk from a `ds:KeyInfo` node up to its role descriptor.
pub fn resolve(doc: &Document, key_info: NodeId) -> Result<CredentialContext> {
    let node = doc.node(key_info)?;
    if !node.is(ElementKind::KeyInfo) {
        return Err(Error::Tree(format!("{} is not ds:KeyInfo", node.name())));
    }

    let key_descriptor = node
        .parent()
        .ok_or_else(|| Error::detached("ds:KeyInfo has no parent"))?;
    let descriptor = doc.node(key_descriptor)?;
    if !descriptor.is(ElementKind::KeyDescriptor) {
        return Err(Error::unexpected_ancestor(format!(
            "expected md:KeyDescriptor above ds:KeyInfo, found {}",
            descriptor.name()
        )));
    }
    let usage = CredentialUsage::from_use(descriptor.attr(ns::attr::USE))?;
    let encryption_methods = doc
        .children_of_kind(key_descriptor, ElementKind::EncryptionMethod)
        .filter_map(|m| doc.get(m).and_then(|n| n.attr(ns::attr::ALGORITHM)))
        .map(str::to_owned)
        .collect();

    let role = descriptor
        .parent()
        .ok_or_else(|| Error::detached("md:KeyDescriptor has no parent"))?;
    let role_node = doc.node(role)?;
    let role_kind = role_node
        .kind()
        .filter(|k| k.is_role_descriptor())
        .ok_or_else(|| {
            Error::unexpected_ancestor(format!(
                "expected a role descriptor above md:KeyDescriptor, found {}",
                role_node.name()
            ))
        })?;
    let protocols = role_node
        .attr(ns::attr::PROTOCOL_SUPPORT_ENUMERATION)
        .map(|v| v.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default();

    let entity_id = match role_node.parent() {
        None => None,
        Some(entity) => {
            let entity_node = doc.node(entity)?;
            if !entity_node.is(ElementKind::EntityDescriptor) {
                return Err(Error::unexpected_ancestor(format!(
                    "expected md:EntityDescriptor above {role_kind}, found {}",
                    entity_node.name()
                )));
            }
            entity_node.attr(ns::attr::ENTITY_ID).map(str::to_owned)
        }
    };

    tracing::debug!(
        role = %role_kind,
        usage = ?usage,
        entity = entity_id.as_deref().unwrap_or("-"),
        "resolved credential context"
    );

    Ok(CredentialContext {
        key_info,
        key_descriptor,
        role,
        role_kind,
        entity_id,
        usage,
        encryption_methods,
        protocols,
    })
}

/// Resolve the context of `key_info` and extract its key.
pub fn resolve_credential(doc: &Document, key_info: NodeId) -> Result<Credential> {
    let context = resolve(doc, key_info)?;
    let key = key_from_key_info(doc, key_info)?.with_usage(context.usage.key_usage());
    Ok(Credential { key, context })
}

/// The credentials of a role usable for `usage`, in document order.
pub fn role_credentials(
    doc: &Document,
    role: NodeId,
    usage: CredentialUsage,
) -> Result<Vec<Credential>> {
    let mut out = Vec::new();
    for descriptor in doc.children_of_kind(role, ElementKind::KeyDescriptor) {
        let Some(key_info) = doc.first_child_of_kind(descriptor, ElementKind::KeyInfo) else {
            continue;
        };
        let credential = resolve_credential(doc, key_info)?;
        if credential.context.usage.permits(usage) {
            out.push(credential);
        }
    }
    Ok(out)
}

/// Extract a key from `ds:X509Data/ds:X509Certificate` or
/// `ds:KeyValue/ds:RSAKeyValue`, naming it after `ds:KeyName` if present.
pub fn key_from_key_info(doc: &Document, key_info: NodeId) -> Result<Key> {
    let text_of = |parent: NodeId, kind: ElementKind| {
        doc.first_child_of_kind(parent, kind)
            .and_then(|c| doc.get(c))
            .and_then(|n| n.text())
    };

    let mut key = None;
    for data in doc.children_of_kind(key_info, ElementKind::X509Data) {
        if let Some(cert) = text_of(data, ElementKind::X509Certificate) {
            key = Some(key_from_x509_certificate(cert)?);
            break;
        }
    }
    if key.is_none() {
        for value in doc.children_of_kind(key_info, ElementKind::KeyValue) {
            let Some(rsa) = doc.first_child_of_kind(value, ElementKind::RsaKeyValue) else {
                continue;
            };
            let modulus = text_of(rsa, ElementKind::Modulus)
                .ok_or_else(|| Error::MissingElement("ds:Modulus".into()))?;
            let exponent = text_of(rsa, ElementKind::Exponent)
                .ok_or_else(|| Error::MissingElement("ds:Exponent".into()))?;
            key = Some(key_from_rsa_key_value(modulus, exponent)?);
            break;
        }
    }

    let key = key.ok_or_else(|| Error::KeyNotFound("ds:KeyInfo carries no usable key".into()))?;
    Ok(match text_of(key_info, ElementKind::KeyName) {
        Some(name) => key.with_name(name.trim()),
        None => key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::default_registry;
    use crate::unmarshal::Unmarshaller;
    use ulriksdal_core::ResolutionErrorKind;

    // A 2048-bit all-ones modulus; key construction does not test primality.
    fn modulus() -> String {
        format!("{}/w==", "////".repeat(85))
    }

    fn metadata() -> String {
        format!(
            r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" xmlns:ds="http://www.w3.org/2000/09/xmldsig#" entityID="https://idp.example.org">
  <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:KeyDescriptor use="signing">
      <ds:KeyInfo>
        <ds:KeyName>idp-signing</ds:KeyName>
        <ds:KeyValue><ds:RSAKeyValue><ds:Modulus>{m}</ds:Modulus><ds:Exponent>AQAB</ds:Exponent></ds:RSAKeyValue></ds:KeyValue>
      </ds:KeyInfo>
    </md:KeyDescriptor>
    <md:KeyDescriptor use="encryption">
      <ds:KeyInfo>
        <ds:KeyValue><ds:RSAKeyValue><ds:Modulus>{m}</ds:Modulus><ds:Exponent>AQAB</ds:Exponent></ds:RSAKeyValue></ds:KeyValue>
      </ds:KeyInfo>
      <md:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes256-cbc"/>
    </md:KeyDescriptor>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="https://idp.example.org/sso"/>
  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#,
            m = modulus()
        )
    }

    fn load() -> (Document, NodeId) {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let root = Unmarshaller::new(&registry)
            .unmarshal_str(&mut doc, &metadata())
            .unwrap();
        (doc, root)
    }

    #[test]
    fn test_resolve_signing_key() {
        let (doc, root) = load();
        let idp = doc.first_child_of_kind(root, ElementKind::IdpSsoDescriptor).unwrap();
        let descriptor = doc.first_child_of_kind(idp, ElementKind::KeyDescriptor).unwrap();
        let key_info = doc.first_child_of_kind(descriptor, ElementKind::KeyInfo).unwrap();

        let credential = resolve_credential(&doc, key_info).unwrap();
        let ctx = &credential.context;
        assert_eq!(ctx.role, idp);
        assert_eq!(ctx.role_kind, ElementKind::IdpSsoDescriptor);
        assert_eq!(ctx.usage, CredentialUsage::Signing);
        assert_eq!(ctx.entity_id.as_deref(), Some("https://idp.example.org"));
        assert_eq!(ctx.protocols, vec![ns::PROTOCOL_SAML2.to_owned()]);
        assert_eq!(credential.key.name.as_deref(), Some("idp-signing"));
        assert_eq!(credential.key.usage, KeyUsage::Signing);
    }

    #[test]
    fn test_role_credentials_by_usage() {
        let (doc, root) = load();
        let idp = doc.first_child_of_kind(root, ElementKind::IdpSsoDescriptor).unwrap();
        let enc = role_credentials(&doc, idp, CredentialUsage::Encryption).unwrap();
        assert_eq!(enc.len(), 1);
        assert_eq!(
            enc[0].context.encryption_methods,
            vec!["http://www.w3.org/2001/04/xmlenc#aes256-cbc".to_owned()]
        );
        assert_eq!(
            role_credentials(&doc, idp, CredentialUsage::Unspecified).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_detached_key_info() {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let key_info = registry.build_kind(&mut doc, ElementKind::KeyInfo).unwrap();
        let err = resolve(&doc, key_info).unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution { kind: ResolutionErrorKind::DetachedNode, .. }
        ));
    }

    #[test]
    fn test_unexpected_ancestor() {
        let registry = default_registry().unwrap();
        let mut doc = Document::new();
        let confirmation = registry
            .build_kind(&mut doc, ElementKind::SubjectConfirmationData)
            .unwrap();
        let key_info = registry.build_kind(&mut doc, ElementKind::KeyInfo).unwrap();
        doc.append_child(confirmation, key_info).unwrap();
        let err = resolve(&doc, key_info).unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution { kind: ResolutionErrorKind::UnexpectedAncestor, .. }
        ));
    }

    #[test]
    fn test_usage_values() {
        assert_eq!(CredentialUsage::from_use(None).unwrap(), CredentialUsage::Unspecified);
        assert!(matches!(
            CredentialUsage::from_use(Some("both")),
            Err(Error::UnknownUsage(_))
        ));
        assert!(CredentialUsage::Unspecified.permits(CredentialUsage::Signing));
        assert!(!CredentialUsage::Encryption.permits(CredentialUsage::Signing));
    }
}
