//! Configuration loading from rhino-mcp.toml.

use std::path::Path;
use std::time::Duration;

use bridge::BridgeConfig;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "rhino-mcp.toml";

pub const ENV_HOST: &str = "RHINO_BRIDGE_HOST";
pub const ENV_PORT: &str = "RHINO_BRIDGE_PORT";
pub const ENV_TIMEOUT: &str = "RHINO_BRIDGE_TIMEOUT";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeSection,

    #[serde(default)]
    pub log: LogSection,
}

/// Where the bridge server listens, and how long clients wait for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-call timeout in seconds. Fractions are allowed.
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_host() -> String {
    bridge::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    bridge::DEFAULT_PORT
}

fn default_timeout() -> f64 {
    bridge::DEFAULT_TIMEOUT.as_secs_f64()
}

fn default_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `RHINO_BRIDGE_*` overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            self.bridge.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.bridge.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { var: ENV_PORT, value: port })?;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.bridge.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { var: ENV_TIMEOUT, value: timeout })?;
        }
        Ok(self)
    }

    /// Apply overrides from the process environment.
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// The client-side view of the bridge section.
    pub fn bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        let secs = self.bridge.timeout_secs;
        let timeout = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or(ConfigError::Timeout(secs))?;
        Ok(BridgeConfig::new(&self.bridge.host, self.bridge.port).with_timeout(timeout))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value {value:?} in {var}")]
    Env { var: &'static str, value: String },

    #[error("bridge timeout must be a positive number of seconds, got {0}")]
    Timeout(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        let bridge = config.bridge_config().unwrap();
        assert_eq!(bridge.base_url(), "http://localhost:8080");
        assert_eq!(bridge.timeout, Duration::from_secs(10));
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn parse_sections() {
        let config = Config::parse(
            r#"
            [bridge]
            host = "10.0.0.5"
            port = 9090
            timeout_secs = 2.5

            [log]
            filter = "host=debug,info"
            "#,
        )
        .unwrap();
        assert_eq!(config.bridge.port, 9090);
        assert_eq!(config.bridge_config().unwrap().timeout, Duration::from_millis(2500));
        assert_eq!(config.log.filter, "host=debug,info");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            Config::parse("[bridge]\nhots = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_file() {
        let config = Config::parse("[bridge]\nport = 9000")
            .unwrap()
            .with_env(env(&[(ENV_HOST, "rhino.local"), (ENV_TIMEOUT, "30")]))
            .unwrap();
        assert_eq!(config.bridge.host, "rhino.local");
        assert_eq!(config.bridge.port, 9000);
        assert_eq!(config.bridge.timeout_secs, 30.0);
    }

    #[test]
    fn bad_env_and_timeout_rejected() {
        let err = Config::default()
            .with_env(env(&[(ENV_PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_PORT, .. }));

        let config = Config::parse("[bridge]\ntimeout_secs = 0").unwrap();
        assert!(matches!(config.bridge_config(), Err(ConfigError::Timeout(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bridge]\nhost = \"127.0.0.1\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.bridge.host, "127.0.0.1");

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(CONFIG_FILE);
        assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());
    }
}
