//! Upstream model configuration.
//!
//! Read once at startup and handed to the gateway and handlers; nothing
//! below this point touches the process environment.

use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the upstream bearer credential.
pub const API_KEY_VAR: &str = "PPLX_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 900;
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Errors raised while reading configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Resolved settings for talking to the chat-completion API.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Bearer credential. `None` leaves the server running but every model
    /// call is refused with a configuration error.
    pub api_key: Option<String>,
    /// API root; `/chat/completions` is appended.
    pub base_url: String,
    /// Fixed model identifier sent with every request.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Number of most recent history turns forwarded upstream.
    pub history_window: usize,
    /// Upstream request timeout. `None` waits as long as the transport does.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("history_window", &self.history_window)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            history_window: DEFAULT_HISTORY_WINDOW,
            timeout: None,
        }
    }
}

impl GatewayConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                      |
    /// |-------------------------|------------------------------|
    /// | `PPLX_API_KEY`          | unset                        |
    /// | `PPLX_BASE_URL`         | `https://api.perplexity.ai`  |
    /// | `PPLX_MODEL`            | `sonar`                      |
    /// | `CHAT_TEMPERATURE`      | `0.2`                        |
    /// | `CHAT_MAX_TOKENS`       | `900`                        |
    /// | `CHAT_HISTORY_WINDOW`   | `10`                         |
    /// | `UPSTREAM_TIMEOUT_SECS` | unset                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GatewayConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let temperature = match get("CHAT_TEMPERATURE") {
            Some(raw) => parse_value::<f32>("CHAT_TEMPERATURE", &raw)
                .and_then(|t| check_range("CHAT_TEMPERATURE", t, &raw))?,
            None => defaults.temperature,
        };
        let max_tokens = match get("CHAT_MAX_TOKENS") {
            Some(raw) => parse_value("CHAT_MAX_TOKENS", &raw)?,
            None => defaults.max_tokens,
        };
        let history_window = match get("CHAT_HISTORY_WINDOW") {
            Some(raw) => parse_value("CHAT_HISTORY_WINDOW", &raw)?,
            None => defaults.history_window,
        };
        let timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_value(
                "UPSTREAM_TIMEOUT_SECS",
                &raw,
            )?)),
            None => None,
        };

        Ok(Self {
            api_key: get(API_KEY_VAR),
            base_url: get("PPLX_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: get("PPLX_MODEL").unwrap_or(defaults.model),
            temperature,
            max_tokens,
            history_window,
            timeout,
        })
    }

    /// Whether an upstream credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full URL of the chat-completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn check_range(key: &'static str, value: f32, raw: &str) -> Result<f32, ConfigError> {
    if (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        })
    }
}
