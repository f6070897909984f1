//! Environment configuration.

use std::env;

pub const DEFAULT_DIAGRAM_ENDPOINT: &str = "http://127.0.0.1:3000";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Origin of the diagram proxy.
    pub diagram_endpoint: String,
    /// `tracing` filter directives.
    pub log_filter: String,
    pub log_json: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            diagram_endpoint: env_string_opt("MDFLOW_DIAGRAM_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_DIAGRAM_ENDPOINT.to_string()),
            log_filter: env_string_opt("MDFLOW_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_json: env_flag("MDFLOW_LOG_JSON"),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            diagram_endpoint: DEFAULT_DIAGRAM_ENDPOINT.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
        }
    }
}

pub fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

pub fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
