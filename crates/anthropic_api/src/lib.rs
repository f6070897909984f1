//! Transport-only client for the Anthropic Messages API.
//!
//! This crate owns request building, header construction, endpoint
//! normalization and response/error parsing for the `/v1/messages` endpoint.
//! It performs exactly one attempt per call: no retries, no streaming, and no
//! timeout unless one is configured explicitly.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod response;
pub mod url;

pub use client::AnthropicApiClient;
pub use config::AnthropicApiConfig;
pub use error::AnthropicApiError;
pub use payload::{MessageParam, MessageRole, MessagesRequest, DEFAULT_MAX_TOKENS};
pub use response::{ContentBlock, MessagesResponse, StopReason, Usage};
pub use url::normalize_messages_url;
