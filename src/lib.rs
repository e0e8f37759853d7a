//! # Leakwatch
//!
//! Live dashboard for water-leak reports held in a hosted Postgres backend.
//!
//! ## Features
//!
//! - **Severity classification**: leak-type labels mapped to Critical / Moderate / Minor
//! - **Statistics**: active, resolved-today, and critical counts over the full set
//! - **Filtering**: status, severity, district, and inclusive date range
//! - **Live updates**: backend change feed triggers a re-fetch; browsers are pushed over WebSocket
//! - **Resolve action**: one-click update of a single report
//!
//! ## Modules
//!
//! - [`report`]: Report model, classifier, filter engine, statistics
//! - [`store`]: Report store trait with PostgREST and in-memory backends
//! - [`dashboard`]: Dashboard state machine, controller, and background session
//! - [`api`]: HTTP server with Axum
//! - [`websocket`]: Browser push hub
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use leakwatch::dashboard::{ControllerSettings, DashboardController};
//! use leakwatch::store::MemoryStore;
//! use leakwatch::websocket::{ConnectionHub, HubConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::demo());
//!     let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
//!     let controller = DashboardController::new(store, hub, ControllerSettings::default());
//!
//!     let outcome = controller.refresh().await?;
//!     println!("{} reports, {} critical", outcome.count, outcome.statistics.critical_active);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod render;
pub mod report;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use report::{
    apply_filters, classify, compute_statistics, DateRange, DistrictFilter, FilterState, Report,
    ReportId, Severity, Statistics, StatusFilter,
};

pub use store::{
    ChangeEvent, ChangeKind, MemoryStore, ReportStore, RestStore, StoreError, StoreResult,
    Subscription,
};

pub use dashboard::{
    Dashboard, DashboardController, DashboardError, DashboardSession, DashboardView, LoadPhase,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, ServerMessage, WsEvent};

pub use config::{generate_default_config, Config, ConfigError, LoadedConfig, LoggingConfig};
