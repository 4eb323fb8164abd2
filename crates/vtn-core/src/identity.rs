//! VTN identity and trust configuration
//!
//! [`IdentityContext`] is built exactly once at startup. It turns the raw
//! credential material of a [`VtnIdentity`] into a validated signing identity
//! and carries the [`FingerprintResolver`] used to authenticate inbound
//! senders. The codec is derived from it, so there is a single answer to
//! "who is this server" and "who do we trust".

use std::sync::Arc;
use tracing::{debug, warn};

use crate::crypto::SigningIdentity;
use crate::error::{Result, VtnError};
use crate::fingerprint::Fingerprint;

/// Resolves a remote party's identifier to its registered fingerprint
///
/// Implementations must be `Send + Sync`; the resolver is shared across all
/// concurrent requests. `None` means the party is unknown to this VTN.
pub trait FingerprintResolver: Send + Sync {
    fn resolve(&self, remote_id: &str) -> Option<Fingerprint>;
}

impl<F> FingerprintResolver for F
where
    F: Fn(&str) -> Option<Fingerprint> + Send + Sync,
{
    fn resolve(&self, remote_id: &str) -> Option<Fingerprint> {
        self(remote_id)
    }
}

/// Raw credential material supplied by the operator
#[derive(Clone, Default)]
pub struct VtnIdentity {
    /// Identifier this VTN uses towards its VENs
    pub id: String,
    /// PEM or DER certificate
    pub certificate: Option<Vec<u8>>,
    /// PEM or DER PKCS#8 private key
    pub private_key: Option<Vec<u8>>,
    /// Passphrase for an encrypted private key
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for VtnIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VtnIdentity")
            .field("id", &self.id)
            .field("certificate", &self.certificate.as_ref().map(|c| c.len()))
            .field("private_key", &self.private_key.as_ref().map(|_| "[redacted]"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl VtnIdentity {
    /// Identity without credentials; messages go out unsigned
    pub fn unsigned(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Identity with a certificate and private key
    pub fn signed(id: impl Into<String>, certificate: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            certificate: Some(certificate),
            private_key: Some(private_key),
            passphrase: None,
        }
    }

    /// Passphrase used to decrypt the private key
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }
}

/// Validated identity plus the inbound trust policy
#[derive(Clone)]
pub struct IdentityContext {
    vtn_id: String,
    signing: Option<Arc<SigningIdentity>>,
    resolver: Option<Arc<dyn FingerprintResolver>>,
}

impl std::fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityContext")
            .field("vtn_id", &self.vtn_id)
            .field("signing", &self.signing)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl IdentityContext {
    /// Validate credentials and build the context
    ///
    /// Certificate and key must be given together. The passphrase is only
    /// consulted when a key is present.
    pub fn new(
        identity: VtnIdentity,
        resolver: Option<Arc<dyn FingerprintResolver>>,
    ) -> Result<Self> {
        if identity.id.trim().is_empty() {
            return Err(VtnError::Configuration("VTN id cannot be empty".into()));
        }

        let signing = match (&identity.certificate, &identity.private_key) {
            (Some(cert), Some(key)) => Some(Arc::new(SigningIdentity::load(
                cert,
                key,
                identity.passphrase.as_deref(),
            )?)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(VtnError::Configuration(
                    "certificate supplied without a private key".into(),
                ));
            }
            (None, Some(_)) => {
                return Err(VtnError::Configuration(
                    "private key supplied without a certificate".into(),
                ));
            }
        };

        match &signing {
            Some(_) => debug!(vtn_id = %identity.id, "Message signing enabled"),
            None => warn!(vtn_id = %identity.id, "No certificate configured; outbound messages are unsigned"),
        }
        if resolver.is_none() {
            warn!(
                vtn_id = %identity.id,
                "No fingerprint resolver configured; inbound senders are not authenticated"
            );
        }

        Ok(Self {
            vtn_id: identity.id,
            signing,
            resolver,
        })
    }

    /// Identifier this VTN signs its messages with
    pub fn vtn_id(&self) -> &str {
        &self.vtn_id
    }

    /// This VTN's certificate fingerprint, for out-of-band distribution
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.signing.as_ref().map(|s| s.fingerprint())
    }

    /// Whether outbound messages carry a signature
    pub fn is_signing(&self) -> bool {
        self.signing.is_some()
    }

    pub fn signing_identity(&self) -> Option<&Arc<SigningIdentity>> {
        self.signing.as_ref()
    }

    /// The inbound trust policy; `None` accepts unauthenticated senders
    pub fn resolver(&self) -> Option<&Arc<dyn FingerprintResolver>> {
        self.resolver.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_context() {
        let ctx = IdentityContext::new(VtnIdentity::unsigned("vtn1"), None).unwrap();
        assert_eq!(ctx.vtn_id(), "vtn1");
        assert!(!ctx.is_signing());
        assert!(ctx.fingerprint().is_none());
    }

    #[test]
    fn test_partial_credentials_rejected() {
        let cert_only = VtnIdentity {
            id: "vtn1".into(),
            certificate: Some(b"cert".to_vec()),
            ..Default::default()
        };
        let err = IdentityContext::new(cert_only, None).unwrap_err();
        assert!(matches!(err, VtnError::Configuration(_)));

        let key_only = VtnIdentity {
            id: "vtn1".into(),
            private_key: Some(b"key".to_vec()),
            ..Default::default()
        };
        let err = IdentityContext::new(key_only, None).unwrap_err();
        assert!(matches!(err, VtnError::Configuration(_)));
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = IdentityContext::new(VtnIdentity::unsigned("  "), None).unwrap_err();
        assert!(matches!(err, VtnError::Configuration(_)));
    }

    #[test]
    fn test_closure_resolver() {
        let fp = Fingerprint::of_certificate(b"ven1-cert");
        let resolver = move |id: &str| (id == "ven1").then_some(fp);

        assert_eq!(resolver.resolve("ven1"), Some(fp));
        assert_eq!(resolver.resolve("ven2"), None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let identity = VtnIdentity::signed("vtn1", b"cert".to_vec(), b"secret-key".to_vec())
            .with_passphrase("hunter2");
        let debug = format!("{:?}", identity);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }
}
