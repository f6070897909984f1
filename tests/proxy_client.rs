use mdflow::{DiagramSource, ProxyDiagramSource, SourceError};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serves one HTTP response and hands back the request body it received.
async fn serve_once(status: u16, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    let (sent, received) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut raw = Vec::new();
        let mut buffer = [0_u8; 2048];
        loop {
            let Ok(n) = socket.read(&mut buffer).await else {
                return;
            };
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buffer[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some((head, rest)) = text.split_once("\r\n\r\n") {
                let length = head
                    .to_ascii_lowercase()
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:").map(str::trim).map(str::to_owned))
                    .and_then(|value| value.parse::<usize>().ok())
                    .unwrap_or(0);
                if rest.len() >= length {
                    let _ = sent.send(rest.to_string());
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    (base, received)
}

#[tokio::test]
async fn posts_section_text_and_returns_value() {
    let (base, request) = serve_once(200, r#"{"type":"text","value":"flowchart LR\nA-->B"}"#).await;
    let source = ProxyDiagramSource::new(&base);

    let text = source.generate("- a\n- b").await.expect("diagram text");

    assert_eq!(text, "flowchart LR\nA-->B");
    let body: serde_json::Value =
        serde_json::from_str(&request.await.expect("request body")).expect("json");
    assert_eq!(body, serde_json::json!({ "text": "- a\n- b" }));
}

#[tokio::test]
async fn error_body_becomes_rejection() {
    let (base, _request) = serve_once(
        429,
        r#"{"error":"Failed to generate diagram","details":"Rate limited"}"#,
    )
    .await;

    let error = ProxyDiagramSource::new(&base)
        .generate("x")
        .await
        .expect_err("429 fails");

    assert_eq!(
        error,
        SourceError::Rejected {
            status: 429,
            message: "Failed to generate diagram".to_string(),
        }
    );
}

#[tokio::test]
async fn non_json_failure_uses_default_message() {
    let (base, _request) = serve_once(502, "<html>bad gateway</html>").await;

    let error = ProxyDiagramSource::new(&base)
        .generate("x")
        .await
        .expect_err("502 fails");

    assert_eq!(
        error,
        SourceError::Rejected {
            status: 502,
            message: "Failed to generate diagram".to_string(),
        }
    );
}

#[tokio::test]
async fn success_without_value_is_a_decode_error() {
    let (base, _request) = serve_once(200, r#"{"type":"text"}"#).await;

    let error = ProxyDiagramSource::new(&base)
        .generate("x")
        .await
        .expect_err("missing value fails");

    assert!(matches!(error, SourceError::Decode(_)));
}
