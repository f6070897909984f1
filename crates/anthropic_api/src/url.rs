/// Default base URL for Anthropic API requests.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Builds the Messages endpoint URL from a configured base.
///
/// A blank base falls back to [`DEFAULT_ANTHROPIC_BASE_URL`]. Trailing slashes
/// are ignored. A base that already names the endpoint is used as is, a base
/// ending at the `/v1` version segment only gains `/messages`, and any other
/// origin or prefix gets the whole `/v1/messages` path.
pub fn normalize_messages_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_ANTHROPIC_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/v1/messages") {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/v1") {
        return format!("{trimmed}/messages");
    }
    format!("{trimmed}/v1/messages")
}
