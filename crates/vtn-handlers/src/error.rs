//! Error types for the handler registry

use thiserror::Error;
use vtn_core::Message;

use crate::catalogue::HandlerName;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Result of invoking a message handler
pub type HandlerResult = std::result::Result<Message, HandlerError>;

/// Errors raised while binding handlers
///
/// Both variants leave the registry untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Name is not part of the extension-point catalogue
    #[error("Unknown handler name '{name}'; valid names are: {}", .valid.join(", "))]
    UnknownHandler {
        name: String,
        valid: Vec<&'static str>,
    },

    /// Extension point already carries an operator binding
    #[error("Handler '{0}' is already bound")]
    AlreadyBound(HandlerName),
}

/// Errors a handler may return instead of a reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Extension point has no operator binding
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// The request payload is unusable for this handler
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Handler failed while processing a valid request
    #[error("Handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    /// Stable label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::NotImplemented(_) => "not_implemented",
            HandlerError::InvalidPayload(_) => "invalid_payload",
            HandlerError::Failed(_) => "handler_failed",
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::InvalidPayload(err.to_string())
    }
}
