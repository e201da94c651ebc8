//! Envelope error types.

use thiserror::Error;

/// Errors raised while reading an envelope off the wire.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("envelope has no boolean `success` field")]
    MissingSuccess,
}

pub type Result<T> = std::result::Result<T, Error>;
