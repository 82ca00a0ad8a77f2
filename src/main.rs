//! logsearch-gateway
//!
//! HTTP gateway in front of a hosted log-search API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Caller ──▶ http (caller id, request id, timeout)
//!                  │
//!                  ▼
//!               service ──▶ admission (burst credits + sliding window)
//!                  │
//!                  ▼
//!               upstream client ──▶ retry with backoff ──▶ log-search API
//!
//!     Background: sweeper drops idle callers
//!     Optional:   Prometheus exporter, admin endpoints
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use logsearch_gateway::admission::Sweeper;
use logsearch_gateway::lifecycle::{self, startup, Shutdown};
use logsearch_gateway::observability::{logging, metrics};
use logsearch_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "logsearch-gateway", version, about = "Rate-limited gateway for log search")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 1. Configuration, before logging so the log level can come from it
    let mut config = startup::load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logsearch-gateway starting");

    // 2. Metrics exporter
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // 3. Core service and background tasks
    let service = lifecycle::build_service(&config)?;
    let shutdown = Shutdown::new();

    let sweeper = Sweeper::new(
        Arc::clone(service.admission()),
        Duration::from_secs(config.admission.sweep_interval_secs),
    );
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.subscribe()));

    // 4. Listener last
    let listener = lifecycle::bind_listener(&config.listener.bind_address).await?;
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, service);

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::wait_for_shutdown_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    shutdown.trigger();
    if let Err(e) = sweeper_task.await {
        tracing::warn!(error = %e, "Sweeper task ended abnormally");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
