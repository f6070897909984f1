//! Proxy settings read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use anthropic_api::{AnthropicApiConfig, DEFAULT_MAX_TOKENS};
use mdflow::config::env_string_opt;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Absent keys are reported per request, not at startup.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Option<Duration>,
    pub listen_addr: SocketAddr,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_string_opt("ANTHROPIC_API_KEY"),
            base_url: env_string_opt("ANTHROPIC_BASE_URL"),
            model: env_string_opt("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_env("ANTHROPIC_MAX_TOKENS", "a positive integer")?
                .unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: parse_env::<u64>("ANTHROPIC_TIMEOUT_SECS", "a number of seconds")?
                .map(Duration::from_secs),
            listen_addr: match parse_env("MDFLOW_PROXY_ADDR", "a socket address")? {
                Some(addr) => addr,
                None => default_listen_addr(),
            },
        })
    }

    /// Client settings, or `None` when no API key is configured.
    pub fn api_config(&self) -> Option<AnthropicApiConfig> {
        let api_key = self.api_key.as_ref()?;
        let mut config = AnthropicApiConfig::new(api_key.clone());
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        Some(config)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn parse_env<T: std::str::FromStr>(
    key: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = env_string_opt(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            key,
            expected,
            value,
        })
}
