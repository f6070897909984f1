use reqwest::StatusCode;

use anthropic_api::error::parse_error_message;

#[test]
fn parse_error_message_prefers_nested_message() {
    let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"Number of requests has exceeded your rate limit"}}"#;
    let message = parse_error_message(StatusCode::TOO_MANY_REQUESTS, body);
    assert_eq!(message, "Number of requests has exceeded your rate limit");
}

#[test]
fn parse_error_message_falls_back_to_error_type() {
    let body = r#"{"type":"error","error":{"type":"overloaded_error"}}"#;
    let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, body);
    assert_eq!(message, "overloaded_error");
}

#[test]
fn parse_error_message_falls_back_to_raw_body() {
    let body = "raw failure text";
    let message = parse_error_message(StatusCode::INTERNAL_SERVER_ERROR, body);
    assert_eq!(message, "raw failure text");
}

#[test]
fn parse_error_message_uses_reason_for_empty_body() {
    let message = parse_error_message(StatusCode::BAD_GATEWAY, "");
    assert_eq!(message, "Bad Gateway");
}
