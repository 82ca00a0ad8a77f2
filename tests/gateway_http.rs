//! End-to-end tests through the HTTP front end.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::{gateway_config, search_body, start_fixed_upstream, start_programmable_upstream, Reply};
use logsearch_gateway::config::GatewayConfig;
use logsearch_gateway::lifecycle::Shutdown;
use logsearch_gateway::{HttpServer, LogSearchService};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const ADMIN_KEY: &str = "admin-secret";

struct Gateway {
    addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), std::io::Error>>,
    http: reqwest::Client,
}

impl Gateway {
    async fn start(config: GatewayConfig) -> Self {
        let service = LogSearchService::from_config(&config).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::new(config, service);
        let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

        Self {
            addr,
            shutdown,
            task,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn search(&self, caller: &str, query: &str) -> reqwest::Response {
        self.http
            .get(self.url("/api/search"))
            .header("x-caller-id", caller)
            .query(&[("q", query)])
            .send()
            .await
            .unwrap()
    }

    fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(ADMIN_KEY)
    }
}

fn config_for(base_url: String, burst_capacity: u32) -> GatewayConfig {
    let mut config = gateway_config(base_url);
    config.api.max_retries = 1;
    config.admission.burst_capacity = burst_capacity;
    config.admin.api_key = Some(ADMIN_KEY.to_string());
    config
}

#[tokio::test]
async fn test_search_success() {
    let upstream = start_programmable_upstream(|_, _| Reply::ok(search_body(&[1, 2]))).await;
    let gateway = Gateway::start(config_for(upstream.base_url(), 5)).await;

    let response = gateway.search("alice", "error").await;
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 2);
    assert_eq!(body["events"][1]["message"], "event 2");
    assert_eq!(body["limit"], 100);
    assert_eq!(upstream.last().query["q"], "error");
}

#[tokio::test]
async fn test_burst_exhaustion_returns_429() {
    let upstream = start_fixed_upstream(200, r#"{"events":[]}"#).await;
    let gateway = Gateway::start(config_for(upstream.base_url(), 2)).await;

    assert_eq!(gateway.search("alice", "x").await.status(), 200);
    assert_eq!(gateway.search("alice", "x").await.status(), 200);

    let denied = gateway.search("alice", "x").await;
    assert_eq!(denied.status(), 429);
    assert_eq!(denied.headers()["retry-after"], "10");
    let body: Value = denied.json().await.unwrap();
    assert_eq!(body["error"], "rate_limit_exceeded");
    assert_eq!(body["retry_after_secs"], 10);

    // Denied calls never reach the upstream.
    assert_eq!(upstream.hits(), 2);

    // Other callers have their own budget.
    assert_eq!(gateway.search("bob", "x").await.status(), 200);
}

#[tokio::test]
async fn test_invalid_input_returns_400_without_spending_credits() {
    let upstream = start_fixed_upstream(200, r#"{"events":[]}"#).await;
    let gateway = Gateway::start(config_for(upstream.base_url(), 5)).await;

    let response = gateway
        .http
        .get(gateway.url("/api/search?q=x&limit=lots"))
        .header("x-caller-id", "alice")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    let empty = gateway.search("alice", "").await;
    assert_eq!(empty.status(), 400);

    assert_eq!(upstream.hits(), 0);
    let status: Value = gateway
        .admin(reqwest::Method::GET, "/admin/clients/alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["tracked"], false);
    assert_eq!(status["burst_tokens"], 5);
}

#[tokio::test]
async fn test_upstream_failures_map_to_gateway_statuses() {
    let failing = start_fixed_upstream(500, "{}").await;
    let gateway = Gateway::start(config_for(failing.base_url(), 5)).await;
    let response = gateway.search("alice", "x").await;
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "api_connection_failure");
    assert_eq!(body["upstream_status"], 500);

    let rejecting = start_fixed_upstream(401, "{}").await;
    let gateway = Gateway::start(config_for(rejecting.base_url(), 5)).await;
    let response = gateway.search("alice", "x").await;
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "api_unauthorized");
    assert_eq!(body["upstream_status"], 401);
}

#[tokio::test]
async fn test_deadline_returns_504() {
    let slow = start_programmable_upstream(|_, _| Reply::ok("[]").delayed(Duration::from_secs(5))).await;
    let mut config = config_for(slow.base_url(), 5);
    config.api.deadline_secs = Some(1);
    let gateway = Gateway::start(config).await;

    let response = gateway
        .http
        .get(gateway.url("/api/systems"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 504);
}

#[tokio::test]
async fn test_systems_groups_and_connectivity() {
    let upstream = start_programmable_upstream(|_, request| {
        if request.path.ends_with("groups.json") {
            Reply::ok(r#"[{"id":1,"name":"prod"}]"#)
        } else {
            Reply::ok(r#"[{"id":1,"name":"web-1"},{"id":2,"name":"web-2"}]"#)
        }
    })
    .await;
    let gateway = Gateway::start(config_for(upstream.base_url(), 5)).await;

    let systems: Value = gateway.http.get(gateway.url("/api/systems")).send().await.unwrap().json().await.unwrap();
    assert_eq!(systems.as_array().unwrap().len(), 2);

    let groups: Value = gateway.http.get(gateway.url("/api/groups")).send().await.unwrap().json().await.unwrap();
    assert_eq!(groups[0]["name"], "prod");

    let report: Value = gateway
        .http
        .get(gateway.url("/api/connectivity"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["connected"], true);
    assert_eq!(report["systems"], 2);

    let health: Value = gateway.http.get(gateway.url("/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], "ok");
    // Caller falls back to the peer IP when no header is sent.
    assert_eq!(health["tracked_clients"], 1);
}

#[tokio::test]
async fn test_admin_endpoints() {
    let upstream = start_fixed_upstream(200, r#"{"events":[]}"#).await;
    let gateway = Gateway::start(config_for(upstream.base_url(), 5)).await;

    let unauthenticated = gateway.http.get(gateway.url("/admin/stats")).send().await.unwrap();
    assert_eq!(unauthenticated.status(), 401);

    gateway.search("alice", "x").await;
    gateway.search("alice", "x").await;
    gateway.search("bob", "x").await;

    let stats: Value = gateway
        .admin(reqwest::Method::GET, "/admin/stats")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["active_clients"], 2);
    assert_eq!(stats["requests_in_window"], 3);

    let alice: Value = gateway
        .admin(reqwest::Method::GET, "/admin/clients/alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(alice["tracked"], true);
    assert_eq!(alice["requests_in_window"], 2);
    assert_eq!(alice["burst_tokens"], 3);

    let reset = gateway
        .admin(reqwest::Method::DELETE, "/admin/clients/alice")
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status(), 200);
    let again = gateway
        .admin(reqwest::Method::DELETE, "/admin/clients/alice")
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);

    let sweep: Value = gateway
        .admin(reqwest::Method::POST, "/admin/sweep")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // bob was active moments ago.
    assert_eq!(sweep["removed"], 0);
    assert_eq!(sweep["remaining"], 1);
}

#[tokio::test]
async fn test_admin_disabled() {
    let upstream = start_fixed_upstream(200, "[]").await;
    let mut config = config_for(upstream.base_url(), 5);
    config.admin.enabled = false;
    let gateway = Gateway::start(config).await;

    let response = gateway.admin(reqwest::Method::GET, "/admin/stats").send().await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_admission_disabled() {
    let upstream = start_fixed_upstream(200, r#"{"events":[]}"#).await;
    let mut config = config_for(upstream.base_url(), 1);
    config.admission.enabled = false;
    let gateway = Gateway::start(config).await;

    for _ in 0..3 {
        assert_eq!(gateway.search("alice", "x").await.status(), 200);
    }
    assert_eq!(upstream.hits(), 3);
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let upstream = start_fixed_upstream(200, "[]").await;
    let gateway = Gateway::start(config_for(upstream.base_url(), 5)).await;
    assert_eq!(
        gateway.http.get(gateway.url("/health")).send().await.unwrap().status(),
        200
    );

    gateway.shutdown.trigger();
    let finished = tokio::time::timeout(Duration::from_secs(5), gateway.task)
        .await
        .expect("server did not stop");
    assert!(finished.unwrap().is_ok());
}
