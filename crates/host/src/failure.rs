//! Failures raised by operation bodies.

use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

use envelope::ErrorKind;

/// Native category of a failure raised inside an operation body.
///
/// The closed set mirrors the failures host operations actually raise;
/// anything else goes in [`FailureKind::Other`] under its own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// A required parameter or lookup key is absent.
    KeyError,
    /// A parameter has a usable type but an unusable value.
    ValueError,
    /// A parameter has the wrong JSON type.
    TypeError,
    /// A document object or property does not exist.
    AttributeError,
    /// The host modeling API refused the operation.
    RuntimeError,
    /// The body panicked.
    Panic,
    Other(String),
}

impl FailureKind {
    pub fn name(&self) -> &str {
        match self {
            Self::KeyError => "KeyError",
            Self::ValueError => "ValueError",
            Self::TypeError => "TypeError",
            Self::AttributeError => "AttributeError",
            Self::RuntimeError => "RuntimeError",
            Self::Panic => "Panic",
            Self::Other(name) => name,
        }
    }

    pub fn debug_hint(&self) -> &'static str {
        match self {
            Self::KeyError => {
                "A required parameter or lookup key is missing. Compare request_data with the parameters the handler reads."
            }
            Self::ValueError => "A parameter value is out of range or unparsable. Check request_data.",
            Self::TypeError => {
                "A parameter has the wrong JSON type. Check request_data against the tool schema."
            }
            Self::AttributeError => {
                "The handler referenced a document object that does not exist. Check the Rhino console."
            }
            Self::RuntimeError => "The host modeling API rejected the call. Check the Rhino console.",
            Self::Panic => "The handler panicked. file_line points at the panic site; check the Rhino console.",
            Self::Other(_) => "Check the Rhino console and the traceback field.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&FailureKind> for ErrorKind {
    fn from(kind: &FailureKind) -> Self {
        ErrorKind::Host(kind.name().to_string())
    }
}

/// A failure raised by an operation body, with the site that raised it.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    kind: FailureKind,
    message: String,
    file_line: String,
    backtrace: String,
}

impl HandlerError {
    #[track_caller]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            kind,
            message: message.into(),
            file_line: format!("{}:{}", location.file(), location.line()),
            backtrace: Backtrace::force_capture().to_string(),
        }
    }

    /// A failure whose site and trace were captured elsewhere (panics).
    pub(crate) fn captured(
        kind: FailureKind,
        message: String,
        file_line: String,
        backtrace: String,
    ) -> Self {
        Self {
            kind,
            message,
            file_line,
            backtrace,
        }
    }

    #[track_caller]
    pub fn key(key: &str) -> Self {
        Self::new(FailureKind::KeyError, format!("missing required parameter '{key}'"))
    }

    #[track_caller]
    pub fn value(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ValueError, message)
    }

    #[track_caller]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(FailureKind::TypeError, message)
    }

    #[track_caller]
    pub fn attribute(message: impl Into<String>) -> Self {
        Self::new(FailureKind::AttributeError, message)
    }

    #[track_caller]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RuntimeError, message)
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `file:line` of the raising site.
    pub fn file_line(&self) -> &str {
        &self.file_line
    }

    /// Full backtrace text captured when the failure was raised.
    pub fn traceback(&self) -> &str {
        &self.backtrace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_raising_site() {
        let err = HandlerError::value("bad depth");
        assert!(err.file_line().contains("failure.rs"), "{}", err.file_line());
        assert_eq!(err.kind().name(), "ValueError");
        assert_eq!(err.to_string(), "ValueError: bad depth");
    }

    #[test]
    fn other_kinds_keep_their_name() {
        let err = HandlerError::new(FailureKind::Other("ZeroDivisionError".into()), "division by zero");
        assert_eq!(ErrorKind::from(err.kind()), ErrorKind::Host("ZeroDivisionError".into()));
    }
}
