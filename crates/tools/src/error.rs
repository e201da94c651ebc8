//! Tool registry error types.

use envelope::ErrorKind;
use thiserror::Error;

/// Reasons discovery refuses a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool {0} is already registered")]
    DuplicateTool(String),

    #[error("invalid tool {name:?}: {reason}")]
    InvalidTool { name: String, reason: String },
}

impl RegistryError {
    /// The `error_type` a skipped tool is logged under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTool(_) => ErrorKind::DuplicateEndpoint,
            Self::InvalidTool { .. } => ErrorKind::InvalidDeclaration,
        }
    }
}
