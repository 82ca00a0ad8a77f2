//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the public and admin handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a listener until the shutdown signal fires

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{AdminConfig, GatewayConfig};
use crate::error::ServiceResult;
use crate::http::request::CallerId;
use crate::service::{LogSearchService, RawSearchParams, SearchParams};
use crate::upstream::{LogGroup, LogSystem, SearchResult};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: LogSearchService,
    pub admin: AdminConfig,
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, service: LogSearchService) -> Self {
        let state = AppState {
            service,
            admin: config.admin.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/api/search", get(search_handler))
            .route("/api/systems", get(systems_handler))
            .route("/api/groups", get(groups_handler))
            .route("/api/connectivity", get(connectivity_handler))
            .route("/health", get(health_handler));

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state.clone()));
        }

        router.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs))),
        )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn search_handler(
    State(state): State<AppState>,
    caller: CallerId,
    Query(raw): Query<RawSearchParams>,
) -> ServiceResult<Json<SearchResult>> {
    let params = SearchParams::parse(&raw)?;
    tracing::debug!(caller_id = %caller.as_str(), query = %params.query, "Search request");

    let page = state.service.search(caller.as_str(), params).await?;
    Ok(Json(SearchResult::Found(page)))
}

async fn systems_handler(
    State(state): State<AppState>,
    caller: CallerId,
) -> ServiceResult<Json<Vec<LogSystem>>> {
    Ok(Json(state.service.list_systems(caller.as_str()).await?))
}

async fn groups_handler(
    State(state): State<AppState>,
    caller: CallerId,
) -> ServiceResult<Json<Vec<LogGroup>>> {
    Ok(Json(state.service.list_groups(caller.as_str()).await?))
}

async fn connectivity_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.service.test_connectivity().await;
    let status = if report.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    tracked_clients: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tracked_clients: state.service.admission().tracked_clients(),
    })
}
