//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use logsearch_gateway::config::{ApiConfig, GatewayConfig};

pub const TEST_TOKEN: &str = "test-token";

/// One request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    /// Header names lowercased.
    pub headers: HashMap<String, String>,
}

/// What the mock upstream sends back.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Handle to a running mock upstream.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` receives the zero-based call number and the parsed request.
pub async fn start_programmable_upstream<F>(f: F) -> MockUpstream
where
    F: Fn(usize, &RecordedRequest) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let f = f.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                handle_connection(socket, f, recorded).await;
            });
        }
    });

    MockUpstream { addr, requests }
}

/// Mock upstream that always sends the same reply.
pub async fn start_fixed_upstream(status: u16, body: &'static str) -> MockUpstream {
    start_programmable_upstream(move |_, _| Reply::new(status, body)).await
}

async fn handle_connection<F>(
    mut socket: TcpStream,
    f: Arc<F>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) where
    F: Fn(usize, &RecordedRequest) -> Reply + Send + Sync + 'static,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };

    let reply = {
        let mut log = recorded.lock().unwrap();
        let call = log.len();
        log.push(request.clone());
        f(call, &request)
    };

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        status_text(reply.status),
        reply.body.len(),
        reply.body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?;

    let (path, raw_query) = target.split_once('?').unwrap_or((target, ""));
    let query = url::form_urlencoded::parse(raw_query.as_bytes())
        .into_owned()
        .collect();

    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    Some(RecordedRequest {
        method,
        path: path.to_string(),
        query,
        headers,
    })
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Client settings pointed at `base_url`, with millisecond backoff.
pub fn api_config(base_url: String) -> ApiConfig {
    ApiConfig {
        base_url,
        token: TEST_TOKEN.to_string(),
        timeout_secs: 5,
        max_retries: 3,
        base_delay_ms: 10,
        max_delay_ms: 100,
        ..ApiConfig::default()
    }
}

pub fn gateway_config(base_url: String) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.api = api_config(base_url);
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

pub fn search_body(ids: &[u64]) -> String {
    let events: Vec<_> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id.to_string(),
                "received_at": "2024-01-01T00:00:00Z",
                "hostname": "web-1",
                "program": "nginx",
                "message": format!("event {id}"),
                "severity": "Error",
                "facility": "Local0",
                "source_id": 42,
                "source_name": "web-1",
                "source_ip": "10.0.0.1"
            })
        })
        .collect();
    serde_json::json!({ "events": events }).to_string()
}
