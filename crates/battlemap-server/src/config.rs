//! Server configuration from the environment.

use std::net::{AddrParseError, SocketAddr};
use thiserror::Error;

/// Listen address variable.
pub const ADDR_VAR: &str = "BATTLEMAP_ADDR";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3030";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var} {value:?}: {source}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        #[source]
        source: AddrParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_value(std::env::var(ADDR_VAR).ok().as_deref())
    }

    /// Build from an optional address string; unset or blank means the default.
    pub fn from_value(value: Option<&str>) -> Result<Self, ConfigError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(DEFAULT_ADDR);
        let addr = value.parse().map_err(|source| ConfigError::InvalidAddr {
            var: ADDR_VAR,
            value: value.to_string(),
            source,
        })?;
        Ok(Self { addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reading the real environment would need `set_var`, which is unsafe in
    // edition 2024, so the parsing is tested directly.

    #[test]
    fn test_default_addr() {
        let config = ServerConfig::from_value(None).unwrap();
        assert_eq!(config.addr, SocketAddr::from(([0, 0, 0, 0], 3030)));
        assert_eq!(ServerConfig::from_value(Some("  ")).unwrap(), config);
    }

    #[test]
    fn test_custom_addr() {
        let config = ServerConfig::from_value(Some("127.0.0.1:9000")).unwrap();
        assert_eq!(config.addr.port(), 9000);
    }

    #[test]
    fn test_invalid_addr() {
        let err = ServerConfig::from_value(Some("localhost")).unwrap_err();
        assert!(err.to_string().contains("BATTLEMAP_ADDR"));
    }
}
