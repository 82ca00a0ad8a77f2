use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admission::{ClientStatus, GlobalStats};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct ResetOutcome {
    pub caller_id: String,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct SweepOutcome {
    pub removed: usize,
    pub remaining: usize,
}

pub async fn get_stats(State(state): State<AppState>) -> Json<GlobalStats> {
    Json(state.service.admission().get_global_stats())
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(caller_id): Path<String>,
) -> Json<ClientStatus> {
    Json(state.service.admission().get_status(&caller_id))
}

/// 404 when the caller was not tracked.
pub async fn reset_client(
    State(state): State<AppState>,
    Path(caller_id): Path<String>,
) -> (StatusCode, Json<ResetOutcome>) {
    let removed = state.service.admission().reset_client(&caller_id);
    let status = if removed { StatusCode::OK } else { StatusCode::NOT_FOUND };
    (status, Json(ResetOutcome { caller_id, removed }))
}

pub async fn run_sweep(State(state): State<AppState>) -> Json<SweepOutcome> {
    let admission = state.service.admission();
    let removed = admission.sweep();
    Json(SweepOutcome {
        removed,
        remaining: admission.tracked_clients(),
    })
}
