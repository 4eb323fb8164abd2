//! Signing credentials
//!
//! A VTN or VEN identifies itself with an X.509 certificate carrying an
//! Ed25519 public key, plus the matching PKCS#8 private key. The key may be
//! encrypted under a passphrase.
//!
//! Key types:
//! - `Certificate`: parsed certificate with its verifying key and fingerprint
//! - `SigningIdentity`: certificate + private key, used to sign outbound messages

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use pkcs8::DecodePrivateKey;
use x509_parser::prelude::*;

use crate::error::{Result, VtnError};
use crate::fingerprint::Fingerprint;

/// Ed25519 OID: 1.3.101.112
const ED25519_OID: &[u64] = &[1, 3, 101, 112];

const PEM_PREFIX: &[u8] = b"-----BEGIN";
const ENCRYPTED_PEM_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// An X.509 certificate holding an Ed25519 public key
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    verifying_key: VerifyingKey,
    fingerprint: Fingerprint,
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

impl Certificate {
    /// Parse a PEM or DER encoded certificate
    pub fn from_pem_or_der(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(PEM_PREFIX) {
            let (_, pem) = x509_parser::pem::parse_x509_pem(bytes)
                .map_err(|e| VtnError::Configuration(format!("invalid certificate PEM: {}", e)))?;
            Self::from_der(&pem.contents)
        } else {
            Self::from_der(bytes)
        }
    }

    /// Parse a DER encoded certificate
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| VtnError::Configuration(format!("X.509 parse error: {}", e)))?;

        let spki = cert.public_key();
        let expected_oid = x509_parser::oid_registry::Oid::from(ED25519_OID)
            .map_err(|_| VtnError::Configuration("invalid Ed25519 OID".into()))?;
        if spki.algorithm.algorithm != expected_oid {
            return Err(VtnError::Configuration(format!(
                "expected Ed25519 certificate key (1.3.101.112), got {}",
                spki.algorithm.algorithm
            )));
        }

        let raw: &[u8] = spki.subject_public_key.as_ref();
        let raw_key: [u8; 32] = raw.try_into().map_err(|_| {
            VtnError::Configuration(format!(
                "expected 32-byte Ed25519 public key, got {} bytes",
                raw.len()
            ))
        })?;
        let verifying_key = VerifyingKey::from_bytes(&raw_key)
            .map_err(|e| VtnError::Configuration(format!("invalid Ed25519 public key: {}", e)))?;

        Ok(Self {
            der: der.to_vec(),
            verifying_key,
            fingerprint: Fingerprint::of_certificate(der),
        })
    }

    /// DER encoding, as embedded in signed messages
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Verify an Ed25519 signature made by this certificate's key
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> std::result::Result<(), String> {
        let signature_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| format!("invalid signature length {}", signature.len()))?;
        let signature = Signature::from_bytes(&signature_bytes);

        self.verifying_key
            .verify(data, &signature)
            .map_err(|e| e.to_string())
    }
}

/// Certificate and private key of the local party
#[derive(Clone)]
pub struct SigningIdentity {
    certificate: Certificate,
    signing_key: SigningKey,
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("certificate", &self.certificate)
            .field("signing_key", &"[redacted]")
            .finish()
    }
}

impl SigningIdentity {
    /// Load a certificate and private key
    ///
    /// The key is PKCS#8 (PEM or DER). When `passphrase` is given the key must
    /// be an encrypted PKCS#8 document. Fails with `Signing` when the key can't
    /// be decoded or decrypted, and with `Configuration` when the certificate
    /// does not belong to the key.
    pub fn load(certificate: &[u8], private_key: &[u8], passphrase: Option<&str>) -> Result<Self> {
        let certificate = Certificate::from_pem_or_der(certificate)?;
        let signing_key = decode_signing_key(private_key, passphrase)?;
        Self::new(certificate, signing_key)
    }

    /// Pair an already parsed certificate with its key
    pub fn new(certificate: Certificate, signing_key: SigningKey) -> Result<Self> {
        if signing_key.verifying_key() != *certificate.verifying_key() {
            return Err(VtnError::Configuration(
                "certificate public key does not match the private key".into(),
            ));
        }
        Ok(Self {
            certificate,
            signing_key,
        })
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.certificate.fingerprint()
    }

    /// Sign arbitrary bytes
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.signing_key.sign(data).to_bytes().to_vec()
    }
}

fn decode_signing_key(key: &[u8], passphrase: Option<&str>) -> Result<SigningKey> {
    let decoded = if key.starts_with(PEM_PREFIX) {
        let pem = std::str::from_utf8(key)
            .map_err(|_| VtnError::Signing("private key PEM is not valid UTF-8".into()))?;
        match passphrase {
            Some(passphrase) => SigningKey::from_pkcs8_encrypted_pem(pem, passphrase),
            None if pem.contains(ENCRYPTED_PEM_LABEL) => {
                return Err(VtnError::Signing(
                    "private key is encrypted but no passphrase was supplied".into(),
                ));
            }
            None => SigningKey::from_pkcs8_pem(pem),
        }
    } else {
        match passphrase {
            Some(passphrase) => SigningKey::from_pkcs8_encrypted_der(key, passphrase),
            None => SigningKey::from_pkcs8_der(key),
        }
    };

    decoded.map_err(|e| {
        if passphrase.is_some() {
            VtnError::Signing(format!("cannot decrypt private key with the given passphrase: {}", e))
        } else {
            VtnError::Signing(format!("cannot decode private key: {}", e))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkcs8::EncodePrivateKey;
    use rand::rngs::OsRng;
    use rcgen::{CertificateParams, KeyPair as RcgenKeyPair, PKCS_ED25519};
    use rustls_pki_types::PrivatePkcs8KeyDer;

    fn self_signed(signing_key: &SigningKey) -> rcgen::Certificate {
        let pkcs8 = signing_key.to_pkcs8_der().unwrap();
        let der = PrivatePkcs8KeyDer::from(pkcs8.as_bytes());
        let key_pair = RcgenKeyPair::from_pkcs8_der_and_sign_algo(&der, &PKCS_ED25519).unwrap();
        CertificateParams::new(vec!["vtn.test".into()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap()
    }

    #[test]
    fn test_certificate_from_der_and_pem_agree() {
        let key = SigningKey::generate(&mut OsRng);
        let cert = self_signed(&key);

        let from_der = Certificate::from_pem_or_der(cert.der()).unwrap();
        let from_pem = Certificate::from_pem_or_der(cert.pem().as_bytes()).unwrap();

        assert_eq!(from_der.fingerprint(), from_pem.fingerprint());
        assert_eq!(from_der.verifying_key(), &key.verifying_key());
        assert_eq!(from_der.fingerprint(), Fingerprint::of_certificate(cert.der()));
    }

    #[test]
    fn test_certificate_rejects_garbage() {
        let err = Certificate::from_pem_or_der(b"definitely not a certificate").unwrap_err();
        assert!(matches!(err, VtnError::Configuration(_)));
    }

    #[test]
    fn test_load_plain_pem_key() {
        let key = SigningKey::generate(&mut OsRng);
        let cert = self_signed(&key);
        let key_pem = key.to_pkcs8_pem(Default::default()).unwrap();

        let identity = SigningIdentity::load(cert.pem().as_bytes(), key_pem.as_bytes(), None).unwrap();
        assert_eq!(identity.fingerprint(), Fingerprint::of_certificate(cert.der()));
    }

    #[test]
    fn test_sign_and_verify() {
        let key = SigningKey::generate(&mut OsRng);
        let cert = self_signed(&key);
        let key_der = key.to_pkcs8_der().unwrap();

        let identity = SigningIdentity::load(cert.der(), key_der.as_bytes(), None).unwrap();
        let signature = identity.sign(b"payload");

        assert_eq!(signature.len(), 64);
        assert!(identity.certificate().verify(b"payload", &signature).is_ok());
        assert!(identity.certificate().verify(b"other", &signature).is_err());
        assert!(identity.certificate().verify(b"payload", &signature[..10]).is_err());
    }

    #[test]
    fn test_mismatched_certificate_and_key() {
        let key = SigningKey::generate(&mut OsRng);
        let other = SigningKey::generate(&mut OsRng);
        let cert = self_signed(&other);
        let key_der = key.to_pkcs8_der().unwrap();

        let err = SigningIdentity::load(cert.der(), key_der.as_bytes(), None).unwrap_err();
        assert!(matches!(err, VtnError::Configuration(_)));
    }

    #[test]
    fn test_garbage_key_is_signing_error() {
        let key = SigningKey::generate(&mut OsRng);
        let cert = self_signed(&key);

        let err = SigningIdentity::load(cert.der(), b"garbage", None).unwrap_err();
        assert!(matches!(err, VtnError::Signing(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = SigningKey::generate(&mut OsRng);
        let cert = self_signed(&key);
        let key_der = key.to_pkcs8_der().unwrap();

        let identity = SigningIdentity::load(cert.der(), key_der.as_bytes(), None).unwrap();
        let debug = format!("{:?}", identity);
        assert!(debug.contains("[redacted]"));
    }
}
