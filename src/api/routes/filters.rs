//! Filter Routes
//!
//! Session default filters, used whenever a request carries none.
//!
//! - GET /api/v1/filters
//! - PUT /api/v1/filters

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::report::FilterState;

/// GET /api/v1/filters
pub async fn get_filters(State(state): State<Arc<AppState>>) -> Json<FilterState> {
    Json(state.controller.filters().await)
}

/// PUT /api/v1/filters
pub async fn put_filters(
    State(state): State<Arc<AppState>>,
    Json(filters): Json<FilterState>,
) -> Json<FilterState> {
    state.controller.set_filters(filters.clone()).await;
    Json(filters)
}
