//! Report Routes
//!
//! - GET /api/v1/reports - Filtered report list
//! - POST /api/v1/reports/:id/resolve - Mark a report resolved

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use super::parse_report_id;
use crate::api::dto::{FilterQuery, ReportDto, ReportsResponse, ResolveResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/reports
///
/// Uses the session filters unless the query string supplies any.
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<ReportsResponse>> {
    let filters = query.to_filters()?;
    let view = state.controller.view(filters.as_ref()).await;

    let reports: Vec<ReportDto> = view.reports.iter().map(ReportDto::from).collect();
    Ok(Json(ReportsResponse {
        count: reports.len(),
        filters: view.filters,
        reports,
    }))
}

/// POST /api/v1/reports/:id/resolve
///
/// 502 when the backend rejects the update.
pub async fn resolve_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResolveResponse>> {
    let id = parse_report_id(&id)?;
    state.controller.resolve(&id).await?;

    Ok(Json(ResolveResponse {
        id,
        status: "resolved".to_string(),
    }))
}
