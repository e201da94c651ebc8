//! Wire contract shared by the Rhino bridge host and its clients.
//!
//! Both processes agree on three things only: a request is an endpoint
//! path plus a JSON object of parameters, a response is a JSON object with
//! at least a boolean `success`, and a failed response carries `error`,
//! `error_type`, `endpoint` and `debug_hint`.
//!
//! # Example
//!
//! ```
//! use envelope::{Envelope, ErrorEnvelope, ErrorKind};
//!
//! let failure: Envelope = ErrorEnvelope::new(ErrorKind::UnknownEndpoint, "Unknown endpoint: /nope")
//!     .endpoint("/nope")
//!     .status_code(404)
//!     .build();
//!
//! assert!(!failure.is_success());
//! assert_eq!(failure.error_type(), Some(ErrorKind::UnknownEndpoint));
//! ```

mod envelope;
mod error;
mod kind;
mod status;

pub use envelope::{Envelope, ErrorEnvelope, RequestEnvelope};
pub use error::{Error, Result};
pub use kind::ErrorKind;
pub use status::{EndpointInfo, INFO_PATH, STATUS_PATH, ServerInfo, StatusReport};

/// Parameter mapping carried by a request.
pub type Params = serde_json::Map<String, serde_json::Value>;
