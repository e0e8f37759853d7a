//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::dashboard::DashboardController;
use crate::websocket::ConnectionHub;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Dashboard state and store access
    pub controller: Arc<DashboardController>,
    /// Server configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for push updates
    pub ws_hub: Arc<ConnectionHub>,
}

impl AppState {
    /// The hub must be the one the controller publishes to
    pub fn new(
        controller: Arc<DashboardController>,
        ws_hub: Arc<ConnectionHub>,
        config: ApiConfig,
    ) -> Self {
        Self {
            controller,
            config: Arc::new(config),
            start_time: Instant::now(),
            ws_hub,
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
