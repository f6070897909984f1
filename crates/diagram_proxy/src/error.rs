use std::collections::BTreeMap;

use anthropic_api::AnthropicApiError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

pub const GENERATE_FAILED: &str = "Failed to generate diagram";

/// Failures of the generate-diagram endpoint, each with a fixed JSON shape.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Configuration error - API key missing")]
    MissingApiKey,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Upstream answered with a non-success status; the status is mirrored.
    #[error("upstream returned {status}: {details}")]
    Upstream {
        status: u16,
        details: String,
        headers: BTreeMap<String, String>,
    },

    #[error("{0}")]
    Transport(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingApiKey | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::MissingApiKey => json!({
                "error": "Configuration error - API key missing",
                "debug": {
                    "envExists": true,
                    "keyExists": false,
                },
            }),
            Self::InvalidBody(details) => json!({
                "error": "Invalid request body",
                "details": details,
            }),
            Self::Upstream {
                status,
                details,
                headers,
            } => {
                let status_text = StatusCode::from_u16(*status)
                    .ok()
                    .and_then(|status| status.canonical_reason())
                    .unwrap_or("");
                json!({
                    "error": GENERATE_FAILED,
                    "details": details,
                    "debug": {
                        "status": status,
                        "statusText": status_text,
                        "headers": headers,
                    },
                })
            }
            Self::Transport(details) => json!({
                "error": GENERATE_FAILED,
                "details": details,
            }),
        }
    }
}

impl From<AnthropicApiError> for ProxyError {
    fn from(error: AnthropicApiError) -> Self {
        match error {
            AnthropicApiError::Status {
                status,
                message,
                headers,
            } => Self::Upstream {
                status: status.as_u16(),
                details: message,
                headers,
            },
            AnthropicApiError::MissingApiKey => Self::MissingApiKey,
            other => Self::Transport(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
