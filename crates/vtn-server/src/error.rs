//! Startup errors for the VTN server

use thiserror::Error;
use vtn_core::VtnError;
use vtn_handlers::RegistryError;

/// Result type for server construction and startup
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that prevent the server from starting
#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing or unusable configuration, including bad credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A handler could not be bound
    #[error("Handler registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Reading credentials or binding the listener failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VtnError> for ServerError {
    fn from(err: VtnError) -> Self {
        ServerError::Configuration(err.to_string())
    }
}
