//! HTTP [`DiagramSource`] backed by the diagram proxy endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EnvConfig;
use crate::panel::{DiagramSource, SourceError};

pub const GENERATE_DIAGRAM_PATH: &str = "/api/claude/generate-diagram";

const DEFAULT_FAILURE_MESSAGE: &str = "Failed to generate diagram";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

impl GenerateResponse {
    fn failure_message(&self) -> String {
        if let Some(error) = self.error.as_deref().filter(|error| !error.is_empty()) {
            return error.to_string();
        }
        match &self.details {
            Some(Value::String(details)) if !details.is_empty() => details.clone(),
            Some(Value::Null) | None => DEFAULT_FAILURE_MESSAGE.to_string(),
            Some(Value::String(_)) => DEFAULT_FAILURE_MESSAGE.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyDiagramSource {
    http: reqwest::Client,
    endpoint: String,
}

impl ProxyDiagramSource {
    /// `base` is the proxy origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(http: reqwest::Client, base: &str) -> Self {
        let endpoint = format!("{}{GENERATE_DIAGRAM_PATH}", base.trim_end_matches('/'));
        Self { http, endpoint }
    }

    pub fn from_config(config: &EnvConfig) -> Self {
        Self::new(&config.diagram_endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DiagramSource for ProxyDiagramSource {
    async fn generate(&self, content: &str) -> Result<String, SourceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&GenerateRequest { text: content })
            .send()
            .await
            .map_err(|error| SourceError::Transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| SourceError::Transport(error.to_string()))?;

        let parsed: GenerateResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(error) if status.is_success() => {
                return Err(SourceError::Decode(error.to_string()));
            }
            Err(_) => GenerateResponse::default(),
        };

        if !status.is_success() || parsed.error.is_some() {
            let message = parsed.failure_message();
            tracing::debug!(status = status.as_u16(), %message, "diagram proxy rejected request");
            return Err(SourceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        parsed
            .value
            .ok_or_else(|| SourceError::Decode("response has no `value`".to_string()))
    }
}
