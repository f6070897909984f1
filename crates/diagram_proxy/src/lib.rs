//! HTTP proxy between the editor and the Anthropic Messages API.
//!
//! Serves `POST /api/claude/generate-diagram`: the request text is wrapped in
//! fixed prompts, sent upstream once, and the reply is cleaned into flowchart
//! source before it is returned.

pub mod config;
pub mod error;
pub mod prompt;
pub mod routes;

use std::sync::Arc;

use anthropic_api::{AnthropicApiClient, AnthropicApiError};
use axum::routing::{get, post};
use axum::Router;

pub use config::{ConfigError, ProxyConfig};
pub use error::ProxyError;
pub use routes::{GenerateDiagramRequest, GenerateDiagramResponse};

pub const GENERATE_DIAGRAM_ROUTE: &str = "/api/claude/generate-diagram";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// `None` when no API key is configured; every request then fails.
    pub client: Option<AnthropicApiClient>,
    pub model: String,
    pub max_tokens: u32,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, AnthropicApiError> {
        let client = config.api_config().map(AnthropicApiClient::new).transpose()?;
        if client.is_none() {
            tracing::warn!("ANTHROPIC_API_KEY is not set; diagram requests will fail");
        }
        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(GENERATE_DIAGRAM_ROUTE, post(routes::generate_diagram))
        .route("/healthz", get(routes::healthz))
        .with_state(Arc::new(state))
}
