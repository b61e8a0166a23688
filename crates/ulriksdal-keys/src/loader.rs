#![forbid(unsafe_code)]

//! Reading signing keys and metadata certificates.
//!
//! Accepted inputs are PEM (PKCS#8, PKCS#1, SPKI, CERTIFICATE) and the
//! matching DER encodings. Every loaded key starts with [`KeyUsage::Any`];
//! callers narrow it from context, e.g. a key descriptor's `use`.

use std::path::Path;

use crate::key::{Key, KeyData, KeyUsage};
use ulriksdal_core::Error;

fn private_rsa(private: rsa::RsaPrivateKey) -> KeyData {
    KeyData::Rsa {
        public: private.to_public_key(),
        private: Some(private),
    }
}

fn private_p256(private: p256::ecdsa::SigningKey) -> KeyData {
    KeyData::EcP256 {
        public: *private.verifying_key(),
        private: Some(private),
    }
}

fn private_p384(private: p384::ecdsa::SigningKey) -> KeyData {
    KeyData::EcP384 {
        public: *private.verifying_key(),
        private: Some(private),
    }
}

/// A PKCS#8 private key: RSA, P-256 or P-384.
pub fn load_private_der(der: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;

    let data = if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
        private_rsa(pk)
    } else if let Ok(sk) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
        private_p256(sk)
    } else if let Ok(sk) = p384::ecdsa::SigningKey::from_pkcs8_der(der) {
        private_p384(sk)
    } else {
        return Err(Error::Key("PKCS#8 key is not RSA, P-256 or P-384".into()));
    };
    Ok(Key::new(data, KeyUsage::Any))
}

/// A SubjectPublicKeyInfo public key.
pub fn load_public_der(der: &[u8]) -> Result<Key, Error> {
    use spki::DecodePublicKey;

    let data = if let Ok(public) = rsa::RsaPublicKey::from_public_key_der(der) {
        KeyData::Rsa {
            private: None,
            public,
        }
    } else if let Ok(public) = p256::ecdsa::VerifyingKey::from_public_key_der(der) {
        KeyData::EcP256 {
            private: None,
            public,
        }
    } else if let Ok(public) = p384::ecdsa::VerifyingKey::from_public_key_der(der) {
        KeyData::EcP384 {
            private: None,
            public,
        }
    } else {
        return Err(Error::Key("public key is not RSA, P-256 or P-384".into()));
    };
    Ok(Key::new(data, KeyUsage::Any))
}

/// The subject key of an X.509 certificate. The certificate becomes the
/// first entry of the key's chain so it can be published in `ds:X509Data`.
pub fn load_certificate_der(der: &[u8]) -> Result<Key, Error> {
    use der::{Decode, Encode};

    let cert = x509_cert::Certificate::from_der(der)
        .map_err(|e| Error::Certificate(format!("unreadable X.509 certificate: {e}")))?;
    let spki = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("certificate key info: {e}")))?;
    let key = load_public_der(&spki)?.with_certificate(der.to_vec());
    tracing::debug!(key = ?key.data, "loaded certificate");
    Ok(key)
}

/// Any supported PEM document, dispatched on its label.
pub fn load_pem(pem: &[u8]) -> Result<Key, Error> {
    let text = std::str::from_utf8(pem).map_err(|e| Error::Key(format!("PEM is not UTF-8: {e}")))?;
    let (label, der) = pem_rfc7468::decode_vec(text.trim().as_bytes())
        .map_err(|e| Error::Key(format!("malformed PEM: {e}")))?;
    match label {
        "PRIVATE KEY" => load_private_der(&der),
        "PUBLIC KEY" => load_public_der(&der),
        "CERTIFICATE" => load_certificate_der(&der),
        "RSA PRIVATE KEY" => {
            use pkcs1::DecodeRsaPrivateKey;
            let pk = rsa::RsaPrivateKey::from_pkcs1_der(&der)
                .map_err(|e| Error::Key(format!("PKCS#1 private key: {e}")))?;
            Ok(Key::new(private_rsa(pk), KeyUsage::Any))
        }
        "RSA PUBLIC KEY" => {
            use pkcs1::DecodeRsaPublicKey;
            let public = rsa::RsaPublicKey::from_pkcs1_der(&der)
                .map_err(|e| Error::Key(format!("PKCS#1 public key: {e}")))?;
            Ok(Key::new(
                KeyData::Rsa {
                    private: None,
                    public,
                },
                KeyUsage::Any,
            ))
        }
        other => Err(Error::Key(format!("unsupported PEM label {other:?}"))),
    }
}

/// Load a key from PEM or DER bytes, trying private key, public key and
/// certificate in that order for DER.
pub fn load_key_bytes(data: &[u8]) -> Result<Key, Error> {
    let start = data.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(data.len());
    if data[start..].starts_with(b"-----BEGIN") {
        return load_pem(data);
    }
    load_private_der(data)
        .or_else(|_| load_public_der(data))
        .or_else(|_| load_certificate_der(data))
        .map_err(|_| Error::Key("DER data is not a key or certificate".into()))
}

/// [`load_key_bytes`] on a file's contents.
pub fn load_key_file(path: &Path) -> Result<Key, Error> {
    tracing::debug!(path = %path.display(), "reading key file");
    let data = std::fs::read(path)?;
    load_key_bytes(&data).map_err(|e| Error::Key(format!("{}: {e}", path.display())))
}
