//! Canned Messages API upstream for proxy tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub struct Upstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl Upstream {
    /// Answers every request with `status`, `headers` and `body`.
    pub async fn reply(status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
        let base_url = format!("http://{}", listener.local_addr().expect("upstream addr"));
        let hits = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let mut head = format!(
            "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
            body.len()
        );
        for (key, value) in headers {
            head.push_str(&format!("{key}: {value}\r\n"));
        }
        head.push_str("\r\n");
        let response = Arc::new(format!("{head}{body}"));

        let handle = tokio::spawn({
            let hits = Arc::clone(&hits);
            let bodies = Arc::clone(&bodies);
            async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    hits.fetch_add(1, Ordering::AcqRel);
                    let response = Arc::clone(&response);
                    let bodies = Arc::clone(&bodies);
                    tokio::spawn(async move {
                        if let Ok(body) = read_body(&mut socket).await {
                            bodies.lock().expect("body log").push(body);
                        }
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
            }
        });

        Self {
            base_url,
            hits,
            bodies,
            handle,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Acquire)
    }

    pub fn last_body(&self) -> Option<String> {
        self.bodies.lock().expect("body log").last().cloned()
    }
}

impl Drop for Upstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn text_reply(text: &str) -> String {
    serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-opus-20240229",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 10, "output_tokens": 20 },
    })
    .to_string()
}

async fn read_body(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut raw = Vec::new();
    let mut buffer = [0_u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(String::new());
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(pos) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_ascii_lowercase();
    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while raw.len() < header_end + length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..n]);
    }
    Ok(String::from_utf8_lossy(&raw[header_end..]).into_owned())
}
