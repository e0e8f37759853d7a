//! Dashboard Routes
//!
//! - GET /api/v1/dashboard - Full dashboard view
//! - GET /api/v1/stats - Stat card values
//! - POST /api/v1/refresh - Manual re-fetch

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FilterQuery, RefreshResponse, StatsResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::DashboardView;

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<DashboardView>> {
    let filters = query.to_filters()?;
    Ok(Json(state.controller.view(filters.as_ref()).await))
}

/// GET /api/v1/stats
///
/// Always computed over the full report set.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let view = state.controller.view(None).await;
    Json(StatsResponse {
        statistics: view.statistics,
        avg_response_time: view.avg_response_time,
        last_updated: view.last_updated,
    })
}

/// POST /api/v1/refresh
pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<Json<RefreshResponse>> {
    let outcome = state.controller.refresh().await?;
    Ok(Json(RefreshResponse {
        count: outcome.count,
        statistics: outcome.statistics,
    }))
}
