//! Host error types.

use envelope::ErrorKind;
use thiserror::Error;

/// Registration and lookup failures of the handler registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("endpoint {0} is already registered")]
    DuplicateEndpoint(String),

    #[error("invalid endpoint {path:?}: {reason}")]
    InvalidEndpoint { path: String, reason: &'static str },

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),
}

impl RegistryError {
    /// The `error_type` this failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateEndpoint(_) => ErrorKind::DuplicateEndpoint,
            Self::InvalidEndpoint { .. } => ErrorKind::InvalidDeclaration,
            Self::UnknownEndpoint(_) => ErrorKind::UnknownEndpoint,
        }
    }
}

/// Errors starting or running the bridge server.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to bind bridge server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("bridge server is not running")]
    NotRunning,
}

pub type Result<T> = std::result::Result<T, Error>;
