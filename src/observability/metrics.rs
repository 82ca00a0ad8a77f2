//! Metrics collection and exposition.
//!
//! # Metrics
//! - `logsearch_admission_total` (counter): admission checks by outcome
//! - `logsearch_tracked_clients` (gauge): callers held by the registry
//! - `logsearch_upstream_attempts_total` (counter): upstream attempts by endpoint, outcome
//! - `logsearch_searches_total` (counter): logical searches by outcome
//! - `logsearch_search_duration_seconds` (histogram): search latency, retries included
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing for it.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one admission check.
pub fn record_admission(outcome: &'static str) {
    counter!("logsearch_admission_total", "outcome" => outcome).increment(1);
}

/// Record the number of callers currently tracked.
pub fn record_tracked_clients(count: usize) {
    gauge!("logsearch_tracked_clients").set(count as f64);
}

/// Record one upstream attempt.
pub fn record_upstream_attempt(endpoint: &'static str, outcome: &'static str) {
    counter!(
        "logsearch_upstream_attempts_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a finished logical search.
pub fn record_search(success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!("logsearch_searches_total", "outcome" => outcome).increment(1);
    histogram!("logsearch_search_duration_seconds").record(elapsed.as_secs_f64());
}
