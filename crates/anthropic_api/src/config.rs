use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_ANTHROPIC_BASE_URL;

/// API version pinned for every request unless overridden.
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Transport configuration for Messages API requests.
#[derive(Clone)]
pub struct AnthropicApiConfig {
    /// Secret passed in the `x-api-key` header.
    pub api_key: String,
    /// Base URL for the API; normalized to `/v1/messages`.
    pub base_url: String,
    /// Value of the `anthropic-version` header.
    pub anthropic_version: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout. Unset means the transport decides.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for AnthropicApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicApiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("anthropic_version", &self.anthropic_version)
            .field("user_agent", &self.user_agent)
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for AnthropicApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl AnthropicApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_anthropic_version(mut self, version: impl Into<String>) -> Self {
        self.anthropic_version = version.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

#[cfg(test)]
mod tests {
    use super::AnthropicApiConfig;

    #[test]
    fn debug_output_never_contains_the_key() {
        let config = AnthropicApiConfig::new("sk-ant-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-ant-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn defaults_pin_version_and_base_url() {
        let config = AnthropicApiConfig::default();
        assert_eq!(config.anthropic_version, "2023-06-01");
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert!(config.timeout.is_none());
    }
}
