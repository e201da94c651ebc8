//! Outbound leg of a tool invocation.

use std::time::{Duration, Instant};

use envelope::{Envelope, ErrorEnvelope, ErrorKind, INFO_PATH, Params, STATUS_PATH, ServerInfo, StatusReport};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};

/// Calls endpoints on the dispatch server.
///
/// There are no retries. Every failure comes back as a final error
/// envelope and the caller decides what to do with it.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    config: BridgeConfig,
    http: reqwest::Client,
}

/// Share of a call's budget allowed for establishing the connection.
///
/// Kept below the whole budget so a handshake that never completes fails
/// as a connect error before the request deadline fires.
const CONNECT_SHARE: f64 = 0.9;

fn connect_budget(timeout: Duration) -> Duration {
    timeout.mul_f64(CONNECT_SHARE)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_budget(timeout))
        .build()
        .map_err(Error::Client)
}

impl BridgeClient {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let http = http_client(config.timeout)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Invoke `endpoint` with the configured timeout.
    pub async fn call(&self, endpoint: &str, params: &Params) -> Envelope {
        self.call_with_timeout(endpoint, params, self.config.timeout).await
    }

    /// Invoke `endpoint`, giving up after `timeout`.
    ///
    /// Never fails: transport errors, timeouts and unreadable bodies are
    /// all turned into error envelopes. An error status that still carries
    /// a valid envelope is passed through with `status_code` added.
    pub async fn call_with_timeout(&self, endpoint: &str, params: &Params, timeout: Duration) -> Envelope {
        let url = self.config.url(endpoint);
        let started = Instant::now();
        debug!(endpoint, %url, "bridge call");

        // The connect deadline is fixed per client, so a shorter budget
        // needs a client of its own.
        let http = if timeout < self.config.timeout {
            match http_client(timeout) {
                Ok(http) => http,
                Err(err) => {
                    return ErrorEnvelope::new(ErrorKind::HttpError, err.to_string())
                        .endpoint(endpoint)
                        .build();
                }
            }
        } else {
            self.http.clone()
        };

        let response = match http.post(&url).json(params).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) => return self.transport_failure(endpoint, err, timeout, started),
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => return self.transport_failure(endpoint, err, timeout, started),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match Envelope::from_slice(&body) {
            Ok(envelope) if status.is_success() => {
                debug!(endpoint, status = status.as_u16(), elapsed_ms, "bridge call done");
                envelope
            }
            Ok(envelope) => {
                warn!(endpoint, status = status.as_u16(), elapsed_ms, "bridge returned error status");
                envelope.with_status_code(status.as_u16())
            }
            Err(err) => {
                warn!(endpoint, status = status.as_u16(), %content_type, "bridge response is not an envelope");
                ErrorEnvelope::new(
                    ErrorKind::JsonDecodeError,
                    format!("Invalid response from bridge server: {err}"),
                )
                .endpoint(endpoint)
                .status_code(status.as_u16())
                .field("raw_response", String::from_utf8_lossy(&body).into_owned())
                .field("content_type", content_type)
                .build()
            }
        }
    }

    fn transport_failure(
        &self,
        endpoint: &str,
        err: reqwest::Error,
        timeout: Duration,
        started: Instant,
    ) -> Envelope {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let bridge_url = self.config.base_url();

        if err.is_connect() {
            warn!(endpoint, %bridge_url, elapsed_ms, error = %err, "bridge unreachable");
            ErrorEnvelope::new(
                ErrorKind::ConnectionError,
                format!(
                    "Cannot connect to Rhino Bridge Server at {bridge_url}. Make sure the bridge server is running in Rhino."
                ),
            )
            .endpoint(endpoint)
            .field("bridge_url", bridge_url)
            .field("elapsed_ms", elapsed_ms)
            .build()
        } else if err.is_timeout() {
            warn!(endpoint, elapsed_ms, "bridge call timed out");
            ErrorEnvelope::new(
                ErrorKind::Timeout,
                format!(
                    "Request to Rhino Bridge Server timed out after {:.1}s",
                    timeout.as_secs_f64()
                ),
            )
            .endpoint(endpoint)
            .field("timeout_secs", timeout.as_secs_f64())
            .field("elapsed_ms", elapsed_ms)
            .field("bridge_url", bridge_url)
            .build()
        } else {
            warn!(endpoint, error = %err, "bridge request failed");
            ErrorEnvelope::new(
                ErrorKind::HttpError,
                format!("Bridge API request failed: {err}"),
            )
            .endpoint(endpoint)
            .field("bridge_url", bridge_url)
            .build()
        }
    }

    /// Probe `GET /status`.
    pub async fn status(&self) -> Result<StatusReport> {
        self.get_json(STATUS_PATH).await
    }

    /// Fetch `GET /info`.
    pub async fn info(&self) -> Result<ServerInfo> {
        self.get_json(INFO_PATH).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.config.url(path);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|source| Error::Unreachable {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| Error::Decode { url, source })
    }
}
