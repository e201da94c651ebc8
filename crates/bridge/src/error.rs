//! Bridge client error types.
//!
//! Only the probe calls (`status`, `info`) return these. Tool invocations
//! never fail with a Rust error; see [`crate::BridgeClient::call`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("cannot reach Rhino bridge at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("bridge returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("bridge returned an unreadable body for {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
