//! Operator endpoints for inspecting and managing admission state.
//!
//! All routes are guarded by a bearer key when `admin.api_key` is set.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;
use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/admin/stats", get(get_stats))
        .route("/admin/clients/{caller_id}", get(get_client).delete(reset_client))
        .route("/admin/sweep", post(run_sweep));

    if state.admin.api_key.is_some() {
        router.route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
    } else {
        tracing::warn!("Admin endpoints enabled without an API key");
        router
    }
}
