use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use mdflow::diagram_text::clean_model_output;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::prompt;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateDiagramRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateDiagramResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl GenerateDiagramResponse {
    pub fn text(value: String) -> Self {
        Self {
            kind: "text".to_string(),
            value,
        }
    }
}

/// `POST /api/claude/generate-diagram`: one upstream call, then cleanup.
pub async fn generate_diagram(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateDiagramRequest>, JsonRejection>,
) -> Result<Json<GenerateDiagramResponse>, ProxyError> {
    let Json(request) = payload.map_err(|rejection| ProxyError::InvalidBody(rejection.body_text()))?;

    let Some(client) = state.client.as_ref() else {
        tracing::error!("API key missing");
        return Err(ProxyError::MissingApiKey);
    };

    let message = prompt::diagram_request(&state.model, state.max_tokens, &request.text);
    let raw = client.send_for_text(&message).await.map_err(|error| {
        tracing::error!(%error, "diagram generation failed");
        ProxyError::from(error)
    })?;

    let value = clean_model_output(&raw);
    tracing::debug!(chars = value.len(), "diagram generated");
    Ok(Json(GenerateDiagramResponse::text(value)))
}

pub async fn healthz() -> &'static str {
    "ok"
}
