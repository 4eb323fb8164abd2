//! Signed wire envelope for protocol messages
//!
//! Every message travels as a COSE_Sign1 structure (CBOR). The protected
//! header names the sender (`kid`), the content type of the JSON payload and,
//! in signed mode, the algorithm (EdDSA) and the sender's X.509 certificate
//! under the `x5chain` label. The receiver compares the certificate's
//! fingerprint with the one registered for the claimed sender, then checks
//! the signature against the certificate's key.
//!
//! Unsigned mode uses the same envelope with no algorithm, certificate or
//! signature.

use coset::cbor::value::Value;
use coset::{iana, CborSerializable, CoseSign1, CoseSign1Builder, HeaderBuilder, Label};
use std::sync::Arc;
use tracing::debug;

use crate::crypto::{Certificate, SigningIdentity};
use crate::error::{AuthenticationFailure, Result, VtnError};
use crate::fingerprint::Fingerprint;
use crate::identity::{FingerprintResolver, IdentityContext};
use crate::message::Message;

/// COSE algorithm identifier for EdDSA (Ed25519)
const EDDSA_ALG: iana::Algorithm = iana::Algorithm::EdDSA;

/// Header label carrying the sender's certificate
const X5CHAIN_LABEL: i64 = iana::HeaderParameter::X5Chain as i64;

const PAYLOAD_CONTENT_TYPE: &str = "application/json";

/// A message that passed decoding and the configured trust checks
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedMessage {
    pub message: Message,
    /// Identifier the sender claimed in the envelope
    pub sender: String,
    /// True when the sender was matched against a registered fingerprint
    pub authenticated: bool,
}

/// Produces wire envelopes on behalf of one sender
#[derive(Debug, Clone)]
pub struct MessageSigner {
    sender_id: String,
    identity: Option<Arc<SigningIdentity>>,
}

impl MessageSigner {
    /// Signer that attaches `identity`'s certificate and signature
    pub fn new(sender_id: impl Into<String>, identity: Arc<SigningIdentity>) -> Self {
        Self {
            sender_id: sender_id.into(),
            identity: Some(identity),
        }
    }

    /// Signer that emits unsigned envelopes
    pub fn unsigned(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            identity: None,
        }
    }

    /// Load credentials and build a signer in one step
    pub fn from_credentials(
        sender_id: impl Into<String>,
        certificate: &[u8],
        private_key: &[u8],
        passphrase: Option<&str>,
    ) -> Result<Self> {
        let identity = SigningIdentity::load(certificate, private_key, passphrase)?;
        Ok(Self::new(sender_id, Arc::new(identity)))
    }

    /// Identifier placed in the `kid` header
    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    /// Whether envelopes carry a certificate and signature
    pub fn is_signing(&self) -> bool {
        self.identity.is_some()
    }

    /// Serialize, sign and wrap a message
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        let payload = message.to_bytes()?;

        let mut header = HeaderBuilder::new()
            .key_id(self.sender_id.as_bytes().to_vec())
            .content_type(PAYLOAD_CONTENT_TYPE.to_string());
        if let Some(identity) = &self.identity {
            header = header
                .algorithm(EDDSA_ALG)
                .value(X5CHAIN_LABEL, Value::Bytes(identity.certificate().der().to_vec()));
        }

        let builder = CoseSign1Builder::new()
            .protected(header.build())
            .payload(payload);

        let cose = match &self.identity {
            Some(identity) => builder.create_signature(&[], |data| identity.sign(data)).build(),
            None => builder.build(),
        };

        cose.to_vec()
            .map_err(|e| VtnError::SerializationError(format!("COSE encoding failed: {:?}", e)))
    }
}

/// Decodes wire envelopes and authenticates their senders
#[derive(Clone, Default)]
pub struct MessageVerifier {
    resolver: Option<Arc<dyn FingerprintResolver>>,
}

impl std::fmt::Debug for MessageVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageVerifier")
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl MessageVerifier {
    /// Verifier that requires every sender to match a registered fingerprint
    pub fn new(resolver: Arc<dyn FingerprintResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Verifier without sender authentication
    ///
    /// Unsigned envelopes are accepted. Signed envelopes are still checked
    /// against their embedded certificate, so tampering is detected, but the
    /// sender is not bound to a known fingerprint.
    pub fn without_resolver() -> Self {
        Self { resolver: None }
    }

    /// Whether senders are bound to registered fingerprints
    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Decode an envelope, authenticate the sender and parse the payload
    ///
    /// Undecodable bytes fail with `MalformedMessage`; every trust failure is
    /// an `Authentication` error. Trust is settled before the payload is
    /// interpreted.
    pub fn decode(&self, bytes: &[u8]) -> Result<VerifiedMessage> {
        let cose = CoseSign1::from_slice(bytes)?;

        let sender = sender_id(&cose)?;

        let authenticated = match &self.resolver {
            Some(resolver) => {
                let expected = resolver
                    .resolve(&sender)
                    .ok_or_else(|| AuthenticationFailure::UnknownSender(sender.clone()))?;
                if cose.signature.is_empty() {
                    return Err(AuthenticationFailure::MissingSignature(sender).into());
                }
                let certificate = embedded_certificate(&cose, &sender)?;
                check_fingerprint(&sender, expected, certificate.fingerprint())?;
                verify_signature(&cose, &certificate, &sender)?;
                true
            }
            None => {
                if !cose.signature.is_empty() {
                    let certificate = embedded_certificate(&cose, &sender)?;
                    verify_signature(&cose, &certificate, &sender)?;
                }
                false
            }
        };

        let payload = cose
            .payload
            .as_deref()
            .ok_or_else(|| VtnError::MalformedMessage("envelope has no payload".into()))?;
        let message = Message::from_bytes(payload)?;
        debug!(
            sender = %sender,
            message_type = %message.message_type,
            authenticated,
            "Decoded message"
        );

        Ok(VerifiedMessage {
            message,
            sender,
            authenticated,
        })
    }
}

/// Signer and verifier for one VTN, shared by every service area
#[derive(Debug, Clone)]
pub struct MessageCodec {
    signer: MessageSigner,
    verifier: MessageVerifier,
    fingerprint: Option<Fingerprint>,
}

impl MessageCodec {
    /// Derive both halves from the identity context
    pub fn new(context: &IdentityContext) -> Self {
        let signer = match context.signing_identity() {
            Some(identity) => MessageSigner::new(context.vtn_id(), identity.clone()),
            None => MessageSigner::unsigned(context.vtn_id()),
        };
        let verifier = match context.resolver() {
            Some(resolver) => MessageVerifier::new(resolver.clone()),
            None => MessageVerifier::without_resolver(),
        };

        Self {
            signer,
            verifier,
            fingerprint: context.fingerprint(),
        }
    }

    /// Encode an outbound message as this VTN
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        self.signer.encode(message)
    }

    /// Decode and authenticate an inbound message
    pub fn decode(&self, bytes: &[u8]) -> Result<VerifiedMessage> {
        self.verifier.decode(bytes)
    }

    pub fn sender_id(&self) -> &str {
        self.signer.sender_id()
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    pub fn signer(&self) -> &MessageSigner {
        &self.signer
    }

    pub fn verifier(&self) -> &MessageVerifier {
        &self.verifier
    }
}

fn sender_id(cose: &CoseSign1) -> Result<String> {
    let kid = &cose.protected.header.key_id;
    if kid.is_empty() {
        return Err(VtnError::MalformedMessage("envelope has no sender id".into()));
    }
    String::from_utf8(kid.clone())
        .map_err(|_| VtnError::MalformedMessage("sender id is not valid UTF-8".into()))
}

fn embedded_certificate(cose: &CoseSign1, sender: &str) -> Result<Certificate> {
    let der = cose
        .protected
        .header
        .rest
        .iter()
        .find_map(|(label, value)| match (label, value) {
            (Label::Int(l), Value::Bytes(der)) if *l == X5CHAIN_LABEL => Some(der),
            _ => None,
        })
        .ok_or_else(|| AuthenticationFailure::InvalidCertificate {
            sender: sender.to_string(),
            reason: "no certificate in envelope".into(),
        })?;

    Certificate::from_der(der).map_err(|e| {
        AuthenticationFailure::InvalidCertificate {
            sender: sender.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn check_fingerprint(sender: &str, expected: Fingerprint, actual: Fingerprint) -> Result<()> {
    if expected != actual {
        return Err(AuthenticationFailure::FingerprintMismatch {
            sender: sender.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into());
    }
    Ok(())
}

fn verify_signature(cose: &CoseSign1, certificate: &Certificate, sender: &str) -> Result<()> {
    let invalid = |reason: String| AuthenticationFailure::InvalidSignature {
        sender: sender.to_string(),
        reason,
    };

    let alg = cose.protected.header.alg.as_ref();
    if alg != Some(&coset::Algorithm::Assigned(EDDSA_ALG)) {
        return Err(invalid(format!("unsupported algorithm {:?}", alg)).into());
    }

    let sig_structure = cose.tbs_data(&[]);
    certificate
        .verify(&sig_structure, &cose.signature)
        .map_err(|reason| invalid(reason).into())
}
