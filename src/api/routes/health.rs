//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (reports loaded at least once)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::dashboard::LoadPhase;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// 200 once the first fetch has succeeded. A later fetch failure keeps the
/// service ready since it still serves the last known reports.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.controller.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let dash = state.controller.snapshot().await;

    let (status, phase) = match dash.phase() {
        LoadPhase::Loaded => ("healthy", "loaded"),
        LoadPhase::Error => ("degraded", "error"),
        LoadPhase::Loading => ("starting", "loading"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        store: state.controller.store().name().to_string(),
        phase: phase.to_string(),
        last_error: dash.last_error().map(|e| e.to_string()),
        last_updated: dash.last_updated(),
        ws_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
