#![forbid(unsafe_code)]

//! Signature algorithms (RSA PKCS#1 v1.5, ECDSA, HMAC).

use crate::digest::{constant_time_eq, DigestMethod};
use signature::SignatureEncoding;
use ulriksdal_core::{algorithm, Error};

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::SigningKey),
    EcP256Public(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP384Public(p384::ecdsa::VerifyingKey),
    Hmac(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashType {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

/// A supported `SignatureMethod` algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureMethod {
    RsaSha1,
    RsaSha256,
    RsaSha384,
    RsaSha512,
    EcdsaSha256,
    EcdsaSha384,
    HmacSha1,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl SignatureMethod {
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        match uri {
            algorithm::RSA_SHA1 => Ok(Self::RsaSha1),
            algorithm::RSA_SHA256 => Ok(Self::RsaSha256),
            algorithm::RSA_SHA384 => Ok(Self::RsaSha384),
            algorithm::RSA_SHA512 => Ok(Self::RsaSha512),
            algorithm::ECDSA_SHA256 => Ok(Self::EcdsaSha256),
            algorithm::ECDSA_SHA384 => Ok(Self::EcdsaSha384),
            algorithm::HMAC_SHA1 => Ok(Self::HmacSha1),
            algorithm::HMAC_SHA256 => Ok(Self::HmacSha256),
            algorithm::HMAC_SHA384 => Ok(Self::HmacSha384),
            algorithm::HMAC_SHA512 => Ok(Self::HmacSha512),
            _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
        }
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha1 => algorithm::RSA_SHA1,
            Self::RsaSha256 => algorithm::RSA_SHA256,
            Self::RsaSha384 => algorithm::RSA_SHA384,
            Self::RsaSha512 => algorithm::RSA_SHA512,
            Self::EcdsaSha256 => algorithm::ECDSA_SHA256,
            Self::EcdsaSha384 => algorithm::ECDSA_SHA384,
            Self::HmacSha1 => algorithm::HMAC_SHA1,
            Self::HmacSha256 => algorithm::HMAC_SHA256,
            Self::HmacSha384 => algorithm::HMAC_SHA384,
            Self::HmacSha512 => algorithm::HMAC_SHA512,
        }
    }

    fn hash(&self) -> HashType {
        match self {
            Self::RsaSha1 | Self::HmacSha1 => HashType::Sha1,
            Self::RsaSha256 | Self::EcdsaSha256 | Self::HmacSha256 => HashType::Sha256,
            Self::RsaSha384 | Self::EcdsaSha384 | Self::HmacSha384 => HashType::Sha384,
            Self::RsaSha512 | Self::HmacSha512 => HashType::Sha512,
        }
    }

    /// The digest method conventionally paired with this algorithm.
    pub fn digest_method(&self) -> DigestMethod {
        match self.hash() {
            HashType::Sha1 => DigestMethod::Sha1,
            HashType::Sha256 => DigestMethod::Sha256,
            HashType::Sha384 => DigestMethod::Sha384,
            HashType::Sha512 => DigestMethod::Sha512,
        }
    }

    pub fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Self::RsaSha1 | Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 => match key {
                SigningKey::Rsa(pk) => rsa_sign(self.hash(), pk, data),
                _ => Err(Error::Key("RSA private key required".into())),
            },
            Self::EcdsaSha256 => {
                use signature::Signer;
                let SigningKey::EcP256(sk) = key else {
                    return Err(Error::Key("P-256 signing key required".into()));
                };
                let sig: p256::ecdsa::Signature = sk.sign(data);
                Ok(p256_to_xmldsig(&sig))
            }
            Self::EcdsaSha384 => {
                use signature::Signer;
                let SigningKey::EcP384(sk) = key else {
                    return Err(Error::Key("P-384 signing key required".into()));
                };
                let sig: p384::ecdsa::Signature = sk.sign(data);
                Ok(p384_to_xmldsig(&sig))
            }
            Self::HmacSha1 | Self::HmacSha256 | Self::HmacSha384 | Self::HmacSha512 => {
                let SigningKey::Hmac(secret) = key else {
                    return Err(Error::Key("HMAC key required".into()));
                };
                compute_hmac(self.hash(), secret, data)
            }
        }
    }

    /// Returns `Ok(false)` for a well-formed signature that does not match.
    pub fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        match self {
            Self::RsaSha1 | Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 => {
                let public = match key {
                    SigningKey::Rsa(pk) => pk.to_public_key(),
                    SigningKey::RsaPublic(pk) => pk.clone(),
                    _ => return Err(Error::Key("RSA key required".into())),
                };
                rsa_verify(self.hash(), &public, data, sig_bytes)
            }
            Self::EcdsaSha256 => {
                use signature::Verifier;
                let vk = match key {
                    SigningKey::EcP256(sk) => *sk.verifying_key(),
                    SigningKey::EcP256Public(vk) => *vk,
                    _ => return Err(Error::Key("P-256 key required".into())),
                };
                let Ok(sig) = xmldsig_to_p256(sig_bytes) else {
                    return Ok(false);
                };
                Ok(vk.verify(data, &sig).is_ok())
            }
            Self::EcdsaSha384 => {
                use signature::Verifier;
                let vk = match key {
                    SigningKey::EcP384(sk) => *sk.verifying_key(),
                    SigningKey::EcP384Public(vk) => *vk,
                    _ => return Err(Error::Key("P-384 key required".into())),
                };
                let Ok(sig) = xmldsig_to_p384(sig_bytes) else {
                    return Ok(false);
                };
                Ok(vk.verify(data, &sig).is_ok())
            }
            Self::HmacSha1 | Self::HmacSha256 | Self::HmacSha384 | Self::HmacSha512 => {
                let SigningKey::Hmac(secret) = key else {
                    return Err(Error::Key("HMAC key required".into()));
                };
                let expected = compute_hmac(self.hash(), secret, data)?;
                Ok(constant_time_eq(&expected, sig_bytes))
            }
        }
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

fn rsa_sign(hash: HashType, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
    use signature::Signer;
    macro_rules! do_sign {
        ($hasher:ty) => {{
            let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
            let sig = sk
                .try_sign(data)
                .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
            Ok(sig.to_vec())
        }};
    }
    match hash {
        HashType::Sha1 => do_sign!(sha1::Sha1),
        HashType::Sha256 => do_sign!(sha2::Sha256),
        HashType::Sha384 => do_sign!(sha2::Sha384),
        HashType::Sha512 => do_sign!(sha2::Sha512),
    }
}

fn rsa_verify(
    hash: HashType,
    public_key: &rsa::RsaPublicKey,
    data: &[u8],
    sig_bytes: &[u8],
) -> Result<bool, Error> {
    use signature::Verifier;
    let Ok(sig) = rsa::pkcs1v15::Signature::try_from(sig_bytes) else {
        return Ok(false);
    };
    macro_rules! do_verify {
        ($hasher:ty) => {{
            let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
            Ok(vk.verify(data, &sig).is_ok())
        }};
    }
    match hash {
        HashType::Sha1 => do_verify!(sha1::Sha1),
        HashType::Sha256 => do_verify!(sha2::Sha256),
        HashType::Sha384 => do_verify!(sha2::Sha384),
        HashType::Sha512 => do_verify!(sha2::Sha512),
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-256.
pub fn xmldsig_to_p256(rs: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    if rs.len() != 64 {
        return Err(Error::Crypto(format!(
            "P-256 signature must be 64 bytes, got {}",
            rs.len()
        )));
    }
    let r = p256::FieldBytes::from_slice(&rs[..32]);
    let s = p256::FieldBytes::from_slice(&rs[32..]);
    p256::ecdsa::Signature::from_scalars(*r, *s)
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature: {e}")))
}

/// Convert a P-256 signature to XML-DSig r||s format.
pub fn p256_to_xmldsig(sig: &p256::ecdsa::Signature) -> Vec<u8> {
    let (r, s) = sig.split_bytes();
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-384.
pub fn xmldsig_to_p384(rs: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    if rs.len() != 96 {
        return Err(Error::Crypto(format!(
            "P-384 signature must be 96 bytes, got {}",
            rs.len()
        )));
    }
    let r = p384::FieldBytes::from_slice(&rs[..48]);
    let s = p384::FieldBytes::from_slice(&rs[48..]);
    p384::ecdsa::Signature::from_scalars(*r, *s)
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature: {e}")))
}

/// Convert a P-384 signature to XML-DSig r||s format.
pub fn p384_to_xmldsig(sig: &p384::ecdsa::Signature) -> Vec<u8> {
    let (r, s) = sig.split_bytes();
    let mut out = Vec::with_capacity(96);
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

// ── HMAC ─────────────────────────────────────────────────────────────

fn compute_hmac(hash: HashType, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    use hmac::{Hmac, Mac};
    macro_rules! hmac_compute {
        ($hasher:ty) => {{
            let mut mac = <Hmac<$hasher>>::new_from_slice(key)
                .map_err(|e| Error::Key(format!("invalid HMAC key: {e}")))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }};
    }
    match hash {
        HashType::Sha1 => hmac_compute!(sha1::Sha1),
        HashType::Sha256 => hmac_compute!(sha2::Sha256),
        HashType::Sha384 => hmac_compute!(sha2::Sha384),
        HashType::Sha512 => hmac_compute!(sha2::Sha512),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_round_trip() {
        for method in [
            SignatureMethod::RsaSha256,
            SignatureMethod::EcdsaSha384,
            SignatureMethod::HmacSha1,
        ] {
            assert_eq!(SignatureMethod::from_uri(method.uri()).unwrap(), method);
        }
        assert!(SignatureMethod::from_uri("urn:nope").is_err());
    }

    #[test]
    fn test_ecdsa_p256_sign_verify() {
        let sk = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let key = SigningKey::EcP256(sk);
        let method = SignatureMethod::EcdsaSha256;
        let sig = method.sign(&key, b"signed info").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(method.verify(&key, b"signed info", &sig).unwrap());
        assert!(!method.verify(&key, b"other", &sig).unwrap());
    }

    #[test]
    fn test_ecdsa_verify_with_other_key_fails() {
        let signer = SigningKey::EcP256(p256::ecdsa::SigningKey::random(&mut rand::thread_rng()));
        let other = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let other = SigningKey::EcP256Public(*other.verifying_key());
        let method = SignatureMethod::EcdsaSha256;
        let sig = method.sign(&signer, b"data").unwrap();
        assert!(!method.verify(&other, b"data", &sig).unwrap());
    }

    #[test]
    fn test_hmac_sign_verify() {
        let key = SigningKey::Hmac(b"secret".to_vec());
        let method = SignatureMethod::HmacSha256;
        let mac = method.sign(&key, b"data").unwrap();
        assert_eq!(mac.len(), 32);
        assert!(method.verify(&key, b"data", &mac).unwrap());
        assert!(!method.verify(&key, b"data", &mac[..16]).unwrap());
    }

    #[test]
    fn test_wrong_key_type() {
        let key = SigningKey::Hmac(b"secret".to_vec());
        assert!(matches!(
            SignatureMethod::RsaSha256.sign(&key, b"x"),
            Err(Error::Key(_))
        ));
    }

    #[test]
    fn test_malformed_signature_is_not_valid() {
        let key = SigningKey::EcP256(p256::ecdsa::SigningKey::random(&mut rand::thread_rng()));
        assert!(!SignatureMethod::EcdsaSha256.verify(&key, b"x", b"short").unwrap());
    }

    #[test]
    fn test_digest_pairing() {
        assert_eq!(SignatureMethod::RsaSha256.digest_method(), DigestMethod::Sha256);
        assert_eq!(SignatureMethod::EcdsaSha384.digest_method(), DigestMethod::Sha384);
        assert_eq!(SignatureMethod::RsaSha1.digest_method(), DigestMethod::Sha1);
    }
}
