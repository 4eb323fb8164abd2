//! Error types for the VTN core

use thiserror::Error;

/// Result type alias using VtnError
pub type Result<T> = std::result::Result<T, VtnError>;

/// Errors raised while bootstrapping credentials or processing wire messages
#[derive(Error, Debug)]
pub enum VtnError {
    /// Credentials are incomplete or inconsistent. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The private key could not be decoded or decrypted
    #[error("Signing error: {0}")]
    Signing(String),

    /// Wire bytes do not form a decodable message
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The sender could not be authenticated
    #[error("Authentication failed: {0}")]
    Authentication(AuthenticationFailure),

    /// Fingerprint text could not be parsed
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Serialization of an outbound message failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl VtnError {
    /// Stable label used as the `error_kind` field in logs
    pub fn kind(&self) -> &'static str {
        match self {
            VtnError::Configuration(_) => "configuration",
            VtnError::Signing(_) => "signing",
            VtnError::MalformedMessage(_) => "malformed_message",
            VtnError::Authentication(_) => "authentication",
            VtnError::InvalidFingerprint(_) => "invalid_fingerprint",
            VtnError::SerializationError(_) => "serialization",
        }
    }

    /// True for failures that say "this sender is not trusted"
    pub fn is_authentication(&self) -> bool {
        matches!(self, VtnError::Authentication(_))
    }
}

/// Why an inbound message was not trusted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationFailure {
    /// No fingerprint is registered for the claimed sender
    #[error("unknown sender '{0}'")]
    UnknownSender(String),

    /// A trusted sender sent an unsigned message
    #[error("message from '{0}' is not signed")]
    MissingSignature(String),

    /// The embedded certificate is absent or unusable
    #[error("invalid certificate from '{sender}': {reason}")]
    InvalidCertificate { sender: String, reason: String },

    /// The embedded certificate is not the one registered for the sender
    #[error("fingerprint mismatch for '{sender}': expected {expected}, got {actual}")]
    FingerprintMismatch {
        sender: String,
        expected: String,
        actual: String,
    },

    /// The signature does not verify against the embedded certificate
    #[error("invalid signature from '{sender}': {reason}")]
    InvalidSignature { sender: String, reason: String },
}

impl From<AuthenticationFailure> for VtnError {
    fn from(failure: AuthenticationFailure) -> Self {
        VtnError::Authentication(failure)
    }
}

impl From<serde_json::Error> for VtnError {
    fn from(err: serde_json::Error) -> Self {
        VtnError::SerializationError(err.to_string())
    }
}

impl From<coset::CoseError> for VtnError {
    fn from(err: coset::CoseError) -> Self {
        VtnError::MalformedMessage(format!("{:?}", err))
    }
}
