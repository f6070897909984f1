mod support;

use diagram_proxy::{router, AppState, ProxyConfig, GENERATE_DIAGRAM_ROUTE};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};
use support::{text_reply, Upstream};
use tokio::net::TcpListener;

fn state_for(upstream: Option<&Upstream>) -> AppState {
    let config = ProxyConfig {
        api_key: upstream.map(|_| "sk-test".to_string()),
        base_url: upstream.map(|upstream| upstream.base_url.clone()),
        ..ProxyConfig::default()
    };
    AppState::from_config(&config).expect("state")
}

/// Serves the router on an ephemeral port and returns its origin.
async fn spawn_proxy(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind proxy");
    let origin = format!("http://{}", listener.local_addr().expect("proxy addr"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });
    origin
}

async fn call(state: AppState, body: &str) -> (StatusCode, Value) {
    let origin = spawn_proxy(state).await;
    let response = reqwest::Client::new()
        .post(format!("{origin}{GENERATE_DIAGRAM_ROUTE}"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .send()
        .await
        .expect("proxy response");
    let status = response.status();
    let text = response.text().await.expect("body text");
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

#[tokio::test]
async fn success_returns_cleaned_diagram_text() {
    let upstream = Upstream::reply(
        200,
        &[],
        &text_reply("Here is the diagram:\n```mermaid\nflowchart TB\nA-->B\n```"),
    )
    .await;

    let (status, body) = call(
        state_for(Some(&upstream)),
        r#"{"text":"- a\n- b"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "type": "text", "value": "flowchart TB\nA-->B" }));
    assert_eq!(upstream.hits(), 1);

    let sent: Value =
        serde_json::from_str(&upstream.last_body().expect("upstream body")).expect("json body");
    assert_eq!(sent["model"], json!("claude-3-opus-20240229"));
    assert_eq!(sent["max_tokens"], json!(4096));
    assert!(sent["messages"][0]["content"]
        .as_str()
        .expect("content")
        .contains("- a\n- b"));
}

#[tokio::test]
async fn bare_edges_get_a_default_declaration() {
    let upstream = Upstream::reply(200, &[], &text_reply("A-->B")).await;

    let (status, body) = call(state_for(Some(&upstream)), r#"{"text":"x"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!("flowchart LR\nA-->B"));
}

#[tokio::test]
async fn missing_key_fails_without_calling_upstream() {
    let upstream = Upstream::reply(200, &[], &text_reply("flowchart LR")).await;

    let (status, body) = call(state_for(None), r#"{"text":"x"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Configuration error - API key missing"));
    assert_eq!(body["debug"]["keyExists"], json!(false));
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn upstream_rejection_is_mirrored() {
    let upstream = Upstream::reply(
        429,
        &[("retry-after", "7")],
        r#"{"type":"error","error":{"type":"rate_limit_error","message":"Rate limited"}}"#,
    )
    .await;

    let (status, body) = call(state_for(Some(&upstream)), r#"{"text":"x"}"#).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], json!("Failed to generate diagram"));
    assert_eq!(body["details"], json!("Rate limited"));
    assert_eq!(body["debug"]["status"], json!(429));
    assert_eq!(body["debug"]["headers"]["retry-after"], json!("7"));
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn unreachable_upstream_is_a_server_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let config = ProxyConfig {
        api_key: Some("sk-test".to_string()),
        base_url: Some(format!("http://{addr}")),
        ..ProxyConfig::default()
    };

    let (status, body) = call(
        AppState::from_config(&config).expect("state"),
        r#"{"text":"x"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to generate diagram"));
    assert!(body["details"].as_str().is_some_and(|details| !details.is_empty()));
    assert!(body.get("debug").is_none());
}

#[tokio::test]
async fn malformed_body_is_rejected_before_the_key_check() {
    let (status, body) = call(state_for(None), "{\"txt\":").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid request body"));
}

#[tokio::test]
async fn healthz_answers_ok() {
    let origin = spawn_proxy(state_for(None)).await;

    let response = reqwest::get(format!("{origin}/healthz"))
        .await
        .expect("healthz response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), "ok");
}
