//! Bodies of the reserved `/status` and `/info` paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_PATH: &str = "/status";
pub const INFO_PATH: &str = "/info";

/// Liveness report returned by `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub success: bool,
    /// Always `"running"` while the listener is up.
    pub status: String,
    pub endpoint_count: usize,
    pub host_available: bool,
    pub grasshopper_available: bool,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

impl StatusReport {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

/// One row of `GET /info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

/// Server description returned by `GET /info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub success: bool,
    pub name: String,
    pub version: String,
    pub endpoints: Vec<EndpointInfo>,
}
