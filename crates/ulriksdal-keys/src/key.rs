#![forbid(unsafe_code)]

//! Key types and data structures.

use ulriksdal_crypto::{SignatureMethod, SigningKey};

/// Declared purpose of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    Signing,
    Encryption,
    Any,
}

impl KeyUsage {
    /// True if a key with this usage may serve `wanted`.
    pub fn permits(&self, wanted: KeyUsage) -> bool {
        *self == KeyUsage::Any || wanted == KeyUsage::Any || *self == wanted
    }
}

/// The underlying key data.
#[derive(Clone)]
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    EcP256 {
        private: Option<p256::ecdsa::SigningKey>,
        public: p256::ecdsa::VerifyingKey,
    },
    EcP384 {
        private: Option<p384::ecdsa::SigningKey>,
        public: p384::ecdsa::VerifyingKey,
    },
    Hmac(Vec<u8>),
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = |private: bool| if private { "private+public" } else { "public" };
        match self {
            Self::Rsa { private, .. } => write!(f, "RSA {} key", kind(private.is_some())),
            Self::EcP256 { private, .. } => write!(f, "EC P-256 {} key", kind(private.is_some())),
            Self::EcP384 { private, .. } => write!(f, "EC P-384 {} key", kind(private.is_some())),
            Self::Hmac(k) => write!(f, "HMAC key ({} bytes)", k.len()),
        }
    }
}

/// A named key with associated data.
#[derive(Debug, Clone)]
pub struct Key {
    pub name: Option<String>,
    pub data: KeyData,
    pub usage: KeyUsage,
    /// X.509 certificate chain (DER), leaf first.
    pub x509_chain: Vec<Vec<u8>>,
}

impl Key {
    pub fn new(data: KeyData, usage: KeyUsage) -> Self {
        Self {
            name: None,
            data,
            usage,
            x509_chain: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_usage(mut self, usage: KeyUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Append a DER certificate to the chain.
    pub fn with_certificate(mut self, der: Vec<u8>) -> Self {
        self.x509_chain.push(der);
        self
    }

    /// Convert to a `SigningKey` for use with the signature algorithms.
    ///
    /// Keys holding a private part convert to the private variant, which can
    /// also verify.
    pub fn to_signing_key(&self) -> SigningKey {
        match &self.data {
            KeyData::Rsa { private: Some(pk), .. } => SigningKey::Rsa(pk.clone()),
            KeyData::Rsa { public, .. } => SigningKey::RsaPublic(public.clone()),
            KeyData::EcP256 { private: Some(sk), .. } => SigningKey::EcP256(sk.clone()),
            KeyData::EcP256 { public, .. } => SigningKey::EcP256Public(*public),
            KeyData::EcP384 { private: Some(sk), .. } => SigningKey::EcP384(sk.clone()),
            KeyData::EcP384 { public, .. } => SigningKey::EcP384Public(*public),
            KeyData::Hmac(k) => SigningKey::Hmac(k.clone()),
        }
    }

    /// The signature algorithm used when the caller does not choose one.
    pub fn default_signature_method(&self) -> SignatureMethod {
        match &self.data {
            KeyData::Rsa { .. } => SignatureMethod::RsaSha256,
            KeyData::EcP256 { .. } => SignatureMethod::EcdsaSha256,
            KeyData::EcP384 { .. } => SignatureMethod::EcdsaSha384,
            KeyData::Hmac(_) => SignatureMethod::HmacSha256,
        }
    }

    pub fn has_private(&self) -> bool {
        match &self.data {
            KeyData::Rsa { private, .. } => private.is_some(),
            KeyData::EcP256 { private, .. } => private.is_some(),
            KeyData::EcP384 { private, .. } => private.is_some(),
            KeyData::Hmac(_) => true,
        }
    }

    /// A copy without private material, suitable for publishing.
    pub fn public_only(&self) -> Key {
        let data = match &self.data {
            KeyData::Rsa { public, .. } => KeyData::Rsa {
                private: None,
                public: public.clone(),
            },
            KeyData::EcP256 { public, .. } => KeyData::EcP256 {
                private: None,
                public: *public,
            },
            KeyData::EcP384 { public, .. } => KeyData::EcP384 {
                private: None,
                public: *public,
            },
            KeyData::Hmac(k) => KeyData::Hmac(k.clone()),
        };
        Key {
            name: self.name.clone(),
            data,
            usage: self.usage,
            x509_chain: self.x509_chain.clone(),
        }
    }

    /// True if both keys carry the same public (or symmetric) material.
    pub fn same_public_key(&self, other: &Key) -> bool {
        match (&self.data, &other.data) {
            (KeyData::Rsa { public: a, .. }, KeyData::Rsa { public: b, .. }) => a == b,
            (KeyData::EcP256 { public: a, .. }, KeyData::EcP256 { public: b, .. }) => a == b,
            (KeyData::EcP384 { public: a, .. }, KeyData::EcP384 { public: b, .. }) => a == b,
            (KeyData::Hmac(a), KeyData::Hmac(b)) => a == b,
            _ => false,
        }
    }

    pub fn rsa_public_key(&self) -> Option<&rsa::RsaPublicKey> {
        match &self.data {
            KeyData::Rsa { public, .. } => Some(public),
            _ => None,
        }
    }
}
