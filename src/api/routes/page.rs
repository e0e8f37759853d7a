//! Page Routes
//!
//! - GET / - HTML dashboard
//! - POST /reports/:id/resolve - Resolve form action, redirects back to the filtered page

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use std::sync::Arc;

use super::parse_report_id;
use crate::api::dto::FilterQuery;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::render::render_dashboard;

/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Html<String>> {
    let filters = query.to_filters()?;
    let view = state.controller.view(filters.as_ref()).await;
    Ok(Html(render_dashboard(&view)))
}

/// POST /reports/:id/resolve
///
/// Failures are recorded on the dashboard and shown in the error banner,
/// so the browser is always sent back to the page it posted from. Filter
/// parameters on the action URL are carried into the redirect.
pub async fn resolve_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Redirect> {
    let id = parse_report_id(&id)?;
    let _ = state.controller.resolve(&id).await;
    Ok(Redirect::to(&return_location(&query)))
}

/// Page URL for the filters in `query`; unparseable filters fall back to `/`
fn return_location(query: &FilterQuery) -> String {
    match query.to_filters() {
        Ok(Some(filters)) => format!("/?{}", filters.to_query_string()),
        Ok(None) => "/".to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Dropping invalid filters from resolve redirect");
            "/".to_string()
        }
    }
}
