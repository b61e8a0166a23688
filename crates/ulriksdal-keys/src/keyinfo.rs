#![forbid(unsafe_code)]

//! Conversions between keys and the text content of `ds:KeyInfo` children.
//!
//! `ds:X509Certificate`, `ds:Modulus` and `ds:Exponent` carry base64 that
//! may be wrapped across lines.

use base64::Engine;

use crate::key::{Key, KeyData, KeyUsage};
use crate::loader::load_certificate_der;
use ulriksdal_core::Error;

const ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Decode a `ds:CryptoBinary` or base64 element value, ignoring whitespace.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if clean.is_empty() {
        return Err(Error::Base64("empty value".into()));
    }
    ENGINE
        .decode(clean.as_bytes())
        .map_err(|e| Error::Base64(e.to_string()))
}

pub fn encode_base64(data: &[u8]) -> String {
    ENGINE.encode(data)
}

/// Build an RSA public key from `ds:Modulus` and `ds:Exponent` text.
pub fn key_from_rsa_key_value(modulus_b64: &str, exponent_b64: &str) -> Result<Key, Error> {
    let modulus = decode_base64(modulus_b64)
        .map_err(|e| Error::Base64(format!("Modulus: {e}")))?;
    let exponent = decode_base64(exponent_b64)
        .map_err(|e| Error::Base64(format!("Exponent: {e}")))?;

    let n = rsa::BigUint::from_bytes_be(&modulus);
    let e = rsa::BigUint::from_bytes_be(&exponent);
    let public = rsa::RsaPublicKey::new(n, e)
        .map_err(|err| Error::Key(format!("invalid RSA public key: {err}")))?;
    Ok(Key::new(
        KeyData::Rsa {
            private: None,
            public,
        },
        KeyUsage::Any,
    ))
}

/// `(Modulus, Exponent)` base64 text for an RSA key, if it is one.
pub fn rsa_key_value(key: &Key) -> Option<(String, String)> {
    use rsa::traits::PublicKeyParts;
    let public = key.rsa_public_key()?;
    Some((
        encode_base64(&public.n().to_bytes_be()),
        encode_base64(&public.e().to_bytes_be()),
    ))
}

/// Load the key from `ds:X509Certificate` text.
pub fn key_from_x509_certificate(cert_b64: &str) -> Result<Key, Error> {
    let der = decode_base64(cert_b64)?;
    load_certificate_der(&der)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wrapped_base64() {
        assert_eq!(decode_base64("aGVs\n  bG8=\n").unwrap(), b"hello");
        assert!(matches!(decode_base64("  "), Err(Error::Base64(_))));
        assert!(decode_base64("!!!").is_err());
    }

    #[test]
    fn test_rsa_key_value_round_trip() {
        let pk = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let key = Key::new(
            KeyData::Rsa {
                public: pk.to_public_key(),
                private: Some(pk),
            },
            KeyUsage::Signing,
        );
        let (m, e) = rsa_key_value(&key).unwrap();
        let back = key_from_rsa_key_value(&m, &e).unwrap();
        assert!(back.same_public_key(&key));
        assert!(!back.has_private());
    }

    #[test]
    fn test_non_rsa_has_no_key_value() {
        let key = Key::new(KeyData::Hmac(vec![0; 8]), KeyUsage::Any);
        assert!(rsa_key_value(&key).is_none());
    }
}
