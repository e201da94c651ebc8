//! The `error_type` taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable failure tag carried as `error_type`.
///
/// The fixed variants cover every failure the bridge itself can produce.
/// Failures raised by an operation body on the host keep their native
/// kind name in [`ErrorKind::Host`] rather than being flattened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorKind {
    ConnectionError,
    Timeout,
    JsonDecodeError,
    HttpError,
    UnknownEndpoint,
    UnknownTool,
    DuplicateEndpoint,
    /// A registration whose declaration is malformed. Registration-time only.
    InvalidDeclaration,
    InvalidHandlerReturn,
    InvalidArguments,
    /// A host-side runtime failure, by native kind (`KeyError`, `ValueError`, ...).
    Host(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ConnectionError => "ConnectionError",
            Self::Timeout => "Timeout",
            Self::JsonDecodeError => "JSONDecodeError",
            Self::HttpError => "HTTPError",
            Self::UnknownEndpoint => "UnknownEndpointError",
            Self::UnknownTool => "UnknownToolError",
            Self::DuplicateEndpoint => "DuplicateEndpointError",
            Self::InvalidDeclaration => "InvalidDeclarationError",
            Self::InvalidHandlerReturn => "InvalidHandlerReturn",
            Self::InvalidArguments => "InvalidArguments",
            Self::Host(name) => name,
        }
    }

    /// Hint pointing at the most likely next diagnostic step.
    pub fn default_hint(&self) -> &'static str {
        match self {
            Self::ConnectionError => {
                "Check that the bridge server is running inside Rhino and reachable at the configured host and port."
            }
            Self::Timeout => {
                "The host may be stuck in a long-running operation. Check the Rhino console, or raise the bridge timeout."
            }
            Self::JsonDecodeError => {
                "The body is probably an unhandled host-side failure page rather than a structured envelope. Check the Rhino console."
            }
            Self::HttpError => "Check the request shape: endpoint path and JSON object body.",
            Self::UnknownEndpoint => {
                "Check that the endpoint is registered on the host. GET /info lists every endpoint."
            }
            Self::UnknownTool => "List the available tools and check the tool name.",
            Self::DuplicateEndpoint => "Two registrations declare the same name. Rename one of them.",
            Self::InvalidDeclaration => "Fix the declaration named in the startup log; the entry was skipped.",
            Self::InvalidHandlerReturn => {
                "The handler must return a JSON object with a boolean `success`. Check its return paths."
            }
            Self::InvalidArguments => "Check the arguments against the tool's parameter schema.",
            Self::Host(_) => "Check the Rhino console and the `traceback` field for the failing line.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorKind {
    fn from(s: &str) -> Self {
        match s {
            "ConnectionError" => Self::ConnectionError,
            "Timeout" => Self::Timeout,
            "JSONDecodeError" => Self::JsonDecodeError,
            "HTTPError" => Self::HttpError,
            "UnknownEndpointError" => Self::UnknownEndpoint,
            "UnknownToolError" => Self::UnknownTool,
            "DuplicateEndpointError" => Self::DuplicateEndpoint,
            "InvalidDeclarationError" => Self::InvalidDeclaration,
            "InvalidHandlerReturn" => Self::InvalidHandlerReturn,
            "InvalidArguments" => Self::InvalidArguments,
            other => Self::Host(other.to_string()),
        }
    }
}

impl From<String> for ErrorKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str().to_string()
    }
}
