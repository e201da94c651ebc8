//! Client for the Rhino bridge dispatch server.
//!
//! [`BridgeClient::call`] is the single place where transport failures are
//! translated into error envelopes, so nothing above it ever sees a raw
//! HTTP error.

mod client;
mod config;
mod error;

pub use client::BridgeClient;
pub use config::{BridgeConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
