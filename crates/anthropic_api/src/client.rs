use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};

use crate::config::AnthropicApiConfig;
use crate::error::{parse_error_message, AnthropicApiError};
use crate::headers::build_headers;
use crate::payload::MessagesRequest;
use crate::response::MessagesResponse;
use crate::url::normalize_messages_url;

#[derive(Debug, Clone)]
pub struct AnthropicApiClient {
    http: Client,
    config: AnthropicApiConfig,
}

impl AnthropicApiClient {
    pub fn new(config: AnthropicApiConfig) -> Result<Self, AnthropicApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AnthropicApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AnthropicApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_messages_url(&self.config.base_url)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, AnthropicApiError> {
        let headers = build_headers(&self.config, user_agent)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    AnthropicApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    AnthropicApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &MessagesRequest,
    ) -> Result<reqwest::RequestBuilder, AnthropicApiError> {
        validate_request(request)?;

        let headers = self.build_headers(self.config.user_agent.as_deref())?;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Send one request and decode the reply. Never retries.
    pub async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, AnthropicApiError> {
        let builder = self.build_request(request)?;
        tracing::debug!(
            endpoint = %self.normalized_endpoint(),
            model = %request.model,
            "sending messages request"
        );

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<MessagesResponse>(&body)?;
        tracing::debug!(
            id = %parsed.id,
            output_tokens = parsed.usage.output_tokens,
            "messages request completed"
        );
        Ok(parsed)
    }

    /// Send one request and return the text of the first text block.
    pub async fn send_for_text(&self, request: &MessagesRequest) -> Result<String, AnthropicApiError> {
        let response = self.send(request).await?;
        response
            .first_text()
            .map(str::to_owned)
            .ok_or(AnthropicApiError::EmptyContent)
    }
}

async fn status_error(response: Response) -> AnthropicApiError {
    let status = response.status();
    let headers = header_snapshot(response.headers());
    let body = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    let message = parse_error_message(status, &body);
    tracing::warn!(status = status.as_u16(), %message, "messages request rejected");

    AnthropicApiError::Status {
        status,
        message,
        headers,
    }
}

fn header_snapshot(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (key.as_str().to_owned(), value.to_owned()))
        })
        .collect()
}

fn validate_request(request: &MessagesRequest) -> Result<(), AnthropicApiError> {
    if request.model.trim().is_empty() {
        return Err(AnthropicApiError::Unknown("'model' must not be empty".to_owned()));
    }
    if request.max_tokens == 0 {
        return Err(AnthropicApiError::Unknown("'max_tokens' must be positive".to_owned()));
    }
    if request.messages.is_empty() {
        return Err(AnthropicApiError::Unknown(
            "'messages' must contain at least one message".to_owned(),
        ));
    }
    Ok(())
}
