//! Client configuration.
//!
//! Defaults match the mediator's stock setup. A config can be built in code,
//! through [`ClientBuilder`](crate::ClientBuilder), or loaded from JSON:
//!
//! ```
//! use amber_client::ClientConfig;
//!
//! let config = ClientConfig::from_json_str(r#"{ "hostname": "robot.local" }"#).unwrap();
//! assert_eq!(config.hostname, "robot.local");
//! assert_eq!(config.port, 26233);
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AmberError, Result};
use crate::protocol::{DEFAULT_PORT, DEFAULT_RECV_BUFFER_SIZE, LENGTH_PREFIX_SIZE};

/// Default mediator hostname.
pub const DEFAULT_HOSTNAME: &str = "127.0.0.1";

/// Default time `terminate` waits for the receive loop to exit.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for an [`AmberClient`](crate::AmberClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Mediator hostname or IP address.
    pub hostname: String,
    /// Mediator UDP port.
    pub port: u16,
    /// Local bind address. `None` binds the wildcard address of the
    /// mediator's family on an ephemeral port.
    pub bind_addr: Option<SocketAddr>,
    /// Receive buffer size; larger datagrams are truncated and then dropped
    /// as malformed.
    pub recv_buffer_size: usize,
    /// Milliseconds `terminate` waits for the receive loop to exit.
    pub terminate_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            bind_addr: None,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            terminate_timeout_ms: DEFAULT_TERMINATE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ClientConfig {
    /// Config for a mediator at `hostname` with all other fields defaulted.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AmberError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Receive-loop exit timeout as a `Duration`.
    #[inline]
    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }

    /// Check the config for values the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(AmberError::Config("hostname must not be empty".to_string()));
        }

        let min = LENGTH_PREFIX_SIZE * 2;
        if self.recv_buffer_size < min {
            return Err(AmberError::Config(format!(
                "recv_buffer_size {} is below minimum {}",
                self.recv_buffer_size, min
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.hostname, "127.0.0.1");
        assert_eq!(config.port, 26233);
        assert_eq!(config.bind_addr, None);
        assert_eq!(config.recv_buffer_size, 4096);
        assert_eq!(config.terminate_timeout(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = ClientConfig::from_json_str(
            r#"{ "hostname": "10.0.0.7", "port": 4000, "bind_addr": "0.0.0.0:5000" }"#,
        )
        .unwrap();

        assert_eq!(config.hostname, "10.0.0.7");
        assert_eq!(config.port, 4000);
        assert_eq!(config.bind_addr, Some("0.0.0.0:5000".parse().unwrap()));
        assert_eq!(config.recv_buffer_size, DEFAULT_RECV_BUFFER_SIZE);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ClientConfig::from_json_str("{ \"port\": \"not a number\" }").unwrap_err();
        assert!(matches!(err, AmberError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_tiny_buffer() {
        let config = ClientConfig {
            recv_buffer_size: 3,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("below minimum 4"));
    }

    #[test]
    fn test_validate_rejects_empty_hostname() {
        assert!(ClientConfig::new("").validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ClientConfig {
            bind_addr: Some("127.0.0.1:0".parse().unwrap()),
            ..ClientConfig::new("robot")
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ClientConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_from_missing_file() {
        let err = ClientConfig::from_json_file("/nonexistent/amber.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
