//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// `--args` was not a JSON object.
    #[error("--args must be a JSON object: {0}")]
    Arguments(String),

    /// The bridge server could not be reached or answered badly.
    #[error(transparent)]
    Bridge(#[from] bridge::Error),

    /// The bridge server could not be started.
    #[error(transparent)]
    Host(#[from] host::Error),

    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    /// A tool call came back with `success: false`.
    #[error("tool call failed: {0}")]
    ToolFailed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
