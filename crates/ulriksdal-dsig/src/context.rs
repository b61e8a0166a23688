#![forbid(unsafe_code)]

//! DSig context: keys and output options for signature operations.

use ulriksdal_core::{Error, Result};
use ulriksdal_keys::{Key, KeyUsage, KeysManager};
use ulriksdal_saml::{Document, Marshalled, NodeId, SignatureParams, TypeRegistry};

/// Keys and configuration for signing and verifying.
#[derive(Debug, Clone)]
pub struct DsigContext {
    pub keys_manager: KeysManager,
    /// Embed the signer's X.509 chain in `ds:KeyInfo` when it has one.
    pub include_certificates: bool,
    /// Embed `ds:RSAKeyValue` when no certificate is embedded.
    pub include_key_value: bool,
    /// Embed `ds:KeyName` when the key is named.
    pub include_key_name: bool,
}

impl Default for DsigContext {
    fn default() -> Self {
        Self::new(KeysManager::new())
    }
}

impl DsigContext {
    pub fn new(keys_manager: KeysManager) -> Self {
        Self {
            keys_manager,
            include_certificates: true,
            include_key_value: true,
            include_key_name: false,
        }
    }

    /// A context holding a single key.
    pub fn with_key(key: Key) -> Self {
        let mut keys_manager = KeysManager::new();
        keys_manager.add_key(key);
        Self::new(keys_manager)
    }

    pub fn include_certificates(mut self, include: bool) -> Self {
        self.include_certificates = include;
        self
    }

    pub fn include_key_value(mut self, include: bool) -> Self {
        self.include_key_value = include;
        self
    }

    pub fn include_key_name(mut self, include: bool) -> Self {
        self.include_key_name = include;
        self
    }

    /// The first private key usable for signing.
    pub fn signing_key(&self) -> Result<&Key> {
        self.keys_manager
            .keys()
            .find(|k| k.has_private() && k.usage.permits(KeyUsage::Signing))
            .ok_or_else(|| Error::KeyNotFound("no private signing key in the keys manager".into()))
    }

    /// Sign `node` with the context's signing key; see [`crate::sign_node`].
    pub fn sign(
        &self,
        doc: &mut Document,
        registry: &TypeRegistry,
        node: NodeId,
        params: SignatureParams,
    ) -> Result<Marshalled> {
        let key = self.signing_key()?;
        let signer = crate::XmlSigner::new(key).with_options(self);
        crate::sign::sign_with(doc, registry, node, &signer, params)
    }

    /// Verify `node` against every signing-capable key until one matches.
    pub fn verify(&self, doc: &Document, registry: &TypeRegistry, node: NodeId) -> Result<()> {
        let candidates: Vec<&Key> = self
            .keys_manager
            .keys()
            .filter(|k| k.usage.permits(KeyUsage::Signing))
            .collect();
        crate::verify::verify_any(doc, registry, node, &candidates)
    }
}
