use std::collections::BTreeMap;
use std::fmt;

pub use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum AnthropicApiError {
    MissingApiKey,
    InvalidHeader(String),
    Request(reqwest::Error),
    /// Upstream answered with a non-success status.
    Status {
        status: StatusCode,
        message: String,
        headers: BTreeMap<String, String>,
    },
    Serde(JsonError),
    /// The reply carried no text content block.
    EmptyContent,
    Unknown(String),
}

impl AnthropicApiError {
    /// Upstream HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(error) => error.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

impl ErrorPayloadFields {
    pub fn message_or_type(&self) -> Option<String> {
        self.message
            .as_deref()
            .and_then(non_empty_string)
            .or_else(|| self.type_.as_deref().and_then(non_empty_string))
            .map(str::to_owned)
    }
}

impl fmt::Display for AnthropicApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "API key is required"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status {
                status, message, ..
            } => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::EmptyContent => write!(f, "response contained no text content"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AnthropicApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AnthropicApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for AnthropicApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract the human-readable message from an upstream error body.
///
/// Prefers `error.message`, then `error.type`, then the raw body, then the
/// canonical reason phrase of `status`.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorPayload { value: Some(error) }) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = error.message_or_type() {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
