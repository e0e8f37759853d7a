//! Leakwatch HTTP API
//!
//! HTTP layer for the leak dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Page
//! - `GET /` - HTML dashboard (accepts filter query)
//! - `POST /reports/:id/resolve` - Resolve form action, redirects to `/`
//!
//! ## Dashboard
//! - `GET /api/v1/dashboard` - Full dashboard view
//! - `GET /api/v1/stats` - Stat card values
//! - `POST /api/v1/refresh` - Re-fetch all reports
//!
//! ## Reports
//! - `GET /api/v1/reports` - Filtered reports
//! - `POST /api/v1/reports/:id/resolve` - Mark a report resolved
//!
//! ## Filters
//! - `GET /api/v1/filters` - Session default filters
//! - `PUT /api/v1/filters` - Replace session default filters
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Push updates
//!
//! Filter query parameters: `status`, `severity` (comma list), `district`,
//! `start`, `end` (YYYY-MM-DD).

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/stats", get(routes::dashboard::get_stats))
        .route("/refresh", post(routes::dashboard::refresh))
        .route("/reports", get(routes::reports::list_reports))
        .route("/reports/:id/resolve", post(routes::reports::resolve_report))
        .route(
            "/filters",
            get(routes::filters::get_filters).put(routes::filters::put_filters),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::page::index))
        .route("/reports/:id/resolve", post(routes::page::resolve_form))
        .route("/ws", get(websocket_handler))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the server and run until a shutdown signal arrives
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Leakwatch listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Leakwatch HTTP server shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{ControllerSettings, DashboardController};
    use crate::report::Report;
    use crate::store::{MemoryStore, ReportStore};
    use crate::websocket::{ConnectionHub, HubConfig};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn sample() -> Vec<Report> {
        vec![
            Report::new(1, "123 Main St", "Burst Pipe")
                .created_at("2025-06-07T10:00:00Z")
                .district("District A"),
            Report::new(2, "456 Park Ave", "Minor Leak")
                .created_at("2025-06-06T14:30:00Z")
                .district("District B")
                .resolved(true),
        ]
    }

    async fn create_test_app(load: bool) -> (Router, Arc<MemoryStore>, Arc<DashboardController>) {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let controller = Arc::new(DashboardController::new(
            store.clone(),
            Arc::clone(&hub),
            ControllerSettings::default(),
        ));
        if load {
            controller.refresh().await.unwrap();
        }

        let state = AppState::new(Arc::clone(&controller), hub, ApiConfig::default());
        (build_router(state), store, controller)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _, _) = create_test_app(false).await;
        let response = app.oneshot(get("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_after_load() {
        let (app, _, controller) = create_test_app(false).await;
        let response = app.clone().oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        controller.refresh().await.unwrap();
        let response = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _, _) = create_test_app(true).await;
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["store"], "memory");
    }

    #[tokio::test]
    async fn test_list_reports() {
        let (app, _, _) = create_test_app(true).await;
        let response = app.oneshot(get("/api/v1/reports")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["reports"][0]["id"], 1);
        assert_eq!(json["reports"][0]["severity"], "Critical");
    }

    #[tokio::test]
    async fn test_list_reports_with_filters() {
        let (app, _, _) = create_test_app(true).await;
        let response = app
            .oneshot(get("/api/v1/reports?status=resolved&severity=Minor,Moderate"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["reports"][0]["id"], 2);
    }

    #[tokio::test]
    async fn test_invalid_filter_is_bad_request() {
        let (app, _, _) = create_test_app(true).await;
        let response = app
            .oneshot(get("/api/v1/reports?status=sometimes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(json["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_stats() {
        let (app, _, _) = create_test_app(true).await;
        let response = app.oneshot(get("/api/v1/stats")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["total_active"], 1);
        assert_eq!(json["critical_active"], 1);
        assert_eq!(json["avg_response_time"], "3.2 hours");
    }

    #[tokio::test]
    async fn test_resolve_report() {
        let (app, store, _) = create_test_app(true).await;
        let response = app
            .clone()
            .oneshot(post("/api/v1/reports/1/resolve"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "resolved");

        let backend = store.list_reports().await.unwrap();
        assert!(backend.iter().all(|r| r.resolved));

        let response = app
            .oneshot(get("/api/v1/reports?status=active"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["count"], 0);
    }

    #[tokio::test]
    async fn test_resolve_failure_is_bad_gateway() {
        let (app, store, _) = create_test_app(true).await;
        store.set_offline(true);

        let response = app
            .clone()
            .oneshot(post("/api/v1/reports/1/resolve"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "UPDATE_FAILED");

        // Dashboard keeps serving the last known set
        let response = app.oneshot(get("/api/v1/dashboard")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["phase"], "error");
        assert_eq!(json["reports"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh() {
        let (app, store, _) = create_test_app(true).await;
        store.insert(Report::new(3, "78 Harbour Rd", "Broken Valve")).await;

        let response = app.oneshot(post("/api/v1/refresh")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["count"], 3);
    }

    #[tokio::test]
    async fn test_put_and_get_filters() {
        let (app, _, _) = create_test_app(true).await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/filters")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"Active","district":"District A"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get("/api/v1/filters")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["status"], "Active");
        assert_eq!(json["district"], "District A");

        // Requests without filter parameters use the session filters
        let response = app.oneshot(get("/api/v1/reports")).await.unwrap();
        assert_eq!(body_json(response).await["count"], 1);
    }

    #[tokio::test]
    async fn test_index_page() {
        let (app, _, _) = create_test_app(true).await;
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Water Leak Dashboard"));
        assert!(html.contains("123 Main St"));
    }

    #[tokio::test]
    async fn test_resolve_form_redirects() {
        let (app, store, _) = create_test_app(true).await;
        let response = app.oneshot(post("/reports/1/resolve")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let backend = store.list_reports().await.unwrap();
        assert!(backend.iter().all(|r| r.resolved));
    }

    #[tokio::test]
    async fn test_resolve_form_keeps_filters() {
        let (app, store, _) = create_test_app(true).await;
        let response = app
            .clone()
            .oneshot(post("/reports/1/resolve?status=active&district=District%20A"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        assert_eq!(
            location,
            "/?status=active&severity=Critical%2CModerate%2CMinor&district=District%20A"
        );
        assert!(store.list_reports().await.unwrap().iter().all(|r| r.resolved));

        // Following the redirect shows the same filtered view
        let response = app
            .oneshot(get(&location.replacen('/', "/api/v1/reports", 1)))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["filters"]["status"], "Active");
        assert_eq!(json["filters"]["district"], "District A");
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_resolve_form_drops_invalid_filters() {
        let (app, _, _) = create_test_app(true).await;
        let response = app
            .oneshot(post("/reports/1/resolve?status=sometimes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
}
