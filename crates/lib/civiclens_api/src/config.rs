//! API server configuration.

use civiclens_core::config::{ConfigError, GatewayConfig};

/// Listener address used when neither `--bind-addr` nor `BIND_ADDR` is given.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3100";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Upstream model settings shared by every handler.
    pub gateway: GatewayConfig,
}

impl ApiConfig {
    /// Reads upstream settings from the environment (see
    /// [`GatewayConfig::from_env`]) and listens on `bind_addr`, falling back
    /// to [`DEFAULT_BIND_ADDR`].
    pub fn from_env(bind_addr: Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: bind_addr.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            gateway: GatewayConfig::from_env()?,
        })
    }
}
