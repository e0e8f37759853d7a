//! Dashboard controller
//!
//! Performs the store calls and feeds their outcomes into the shared
//! [`Dashboard`]. The state lock is only taken for the synchronous update
//! after a call returns, never across an await on the store.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::state::{Dashboard, DashboardError, DashboardView};
use crate::report::{FilterState, ReportId, Statistics};
use crate::store::ReportStore;
use crate::websocket::{ConnectionHub, WsEvent};

/// Behaviour switches for the controller
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Re-fetch after a successful resolve
    pub refetch_after_resolve: bool,
    /// Shown on the Avg Response Time card
    pub avg_response_time: String,
    /// Filters in effect when the session starts
    pub default_filters: FilterState,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            refetch_after_resolve: true,
            avg_response_time: "3.2 hours".to_string(),
            default_filters: FilterState::default(),
        }
    }
}

/// Outcome of a successful refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub count: usize,
    pub statistics: Statistics,
}

pub struct DashboardController {
    store: Arc<dyn ReportStore>,
    state: RwLock<Dashboard>,
    hub: Arc<ConnectionHub>,
    refetch_after_resolve: bool,
}

impl DashboardController {
    pub fn new(
        store: Arc<dyn ReportStore>,
        hub: Arc<ConnectionHub>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            store,
            state: RwLock::new(Dashboard::new(
                settings.default_filters,
                settings.avg_response_time,
            )),
            hub,
            refetch_after_resolve: settings.refetch_after_resolve,
        }
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Re-read the full report set and replace the local copy
    pub async fn refresh(&self) -> Result<RefreshOutcome, DashboardError> {
        let result = self.store.list_reports().await;
        let now = Utc::now();

        let mut dash = self.state.write().await;
        match result {
            Ok(reports) => {
                let count = reports.len();
                dash.apply_fetch(reports, now);
                let statistics = dash.statistics(now.date_naive());
                drop(dash);

                tracing::debug!(count, "Reports refreshed");
                self.hub
                    .publish(WsEvent::reports_changed(count, statistics, Some(now)));
                Ok(RefreshOutcome { count, statistics })
            }
            Err(e) => {
                dash.fetch_failed(e.to_string());
                drop(dash);

                let err = DashboardError::Fetch {
                    message: e.to_string(),
                };

                tracing::error!(error = %e, store = self.store.name(), "Failed to fetch reports");
                self.hub.publish(WsEvent::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Mark one report resolved on the backend, then mirror it locally
    pub async fn resolve(&self, id: &ReportId) -> Result<(), DashboardError> {
        if let Err(e) = self.store.mark_resolved(id).await {
            let err = DashboardError::Update {
                id: id.clone(),
                message: e.to_string(),
            };
            self.state.write().await.resolve_failed(id, e.to_string());

            tracing::error!(report_id = %id, error = %e, "Failed to resolve report");
            self.hub.publish(WsEvent::error(err.to_string()));
            return Err(err);
        }

        let now = Utc::now();
        {
            let mut dash = self.state.write().await;
            if !dash.apply_resolved(id, now) {
                tracing::debug!(report_id = %id, "Resolved report not in local set");
            }
            let statistics = dash.statistics(now.date_naive());
            let count = dash.reports().len();
            self.hub
                .publish(WsEvent::reports_changed(count, statistics, Some(now)));
        }
        tracing::info!(report_id = %id, "Report resolved");

        if self.refetch_after_resolve {
            // A failed re-fetch is recorded on the dashboard; the resolve itself stands
            let _ = self.refresh().await;
        }
        Ok(())
    }

    /// Move the "last updated" clock without touching report data
    pub async fn tick(&self) {
        let now = Utc::now();
        self.state.write().await.touch_clock(now);
        self.hub.publish(WsEvent::clock(now));
    }

    /// Snapshot with the session filters, or `filters` when given
    pub async fn view(&self, filters: Option<&FilterState>) -> DashboardView {
        let today = Utc::now().date_naive();
        let dash = self.state.read().await;
        match filters {
            Some(filters) => dash.view_with(filters, today),
            None => dash.view(today),
        }
    }

    pub async fn statistics(&self) -> Statistics {
        self.state.read().await.statistics(Utc::now().date_naive())
    }

    pub async fn filters(&self) -> FilterState {
        self.state.read().await.filters().clone()
    }

    pub async fn set_filters(&self, filters: FilterState) {
        tracing::debug!(?filters, "Session filters updated");
        self.state.write().await.set_filters(filters);
    }

    /// Whether at least one fetch has succeeded
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.has_loaded()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> Dashboard {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::LoadPhase;
    use crate::report::{Report, StatusFilter};
    use crate::store::MemoryStore;
    use crate::websocket::{HubConfig, ServerMessage};

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

    fn controller(store: Arc<MemoryStore>) -> (DashboardController, Arc<ConnectionHub>) {
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let controller =
            DashboardController::new(store, Arc::clone(&hub), ControllerSettings::default());
        (controller, hub)
    }

    #[tokio::test]
    async fn test_refresh_loads_reports() {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let (controller, _hub) = controller(store);
        assert!(!controller.is_ready().await);

        let outcome = controller.refresh().await.unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.statistics.total_active, 1);
        assert_eq!(outcome.statistics.critical_active, 1);

        let view = controller.view(None).await;
        assert_eq!(view.phase, LoadPhase::Loaded);
        assert_eq!(view.reports[0].id, ReportId::Int(1));
        assert!(controller.is_ready().await);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_last_known() {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let (controller, hub) = controller(Arc::clone(&store));
        let mut tap = hub.subscribe_broadcast();

        controller.refresh().await.unwrap();
        store.set_offline(true);

        let err = controller.refresh().await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch { .. }));

        let view = controller.view(None).await;
        assert_eq!(view.phase, LoadPhase::Error);
        assert_eq!(view.reports.len(), 2);
        assert!(view.error.is_some());

        // reports_changed from the first refresh, then the error
        assert_eq!(tap.recv().await.unwrap().topic, "reports");
        let event = tap.recv().await.unwrap();
        assert_eq!(event.topic, "system");
        assert!(matches!(event.message, ServerMessage::Error { .. }));

        store.set_offline(false);
        controller.refresh().await.unwrap();
        assert!(controller.view(None).await.error.is_none());
    }

    #[tokio::test]
    async fn test_resolve_updates_local_and_backend() {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let (controller, _hub) = controller(Arc::clone(&store));
        controller.refresh().await.unwrap();

        controller.resolve(&ReportId::Int(1)).await.unwrap();

        let active = FilterState::default().status(StatusFilter::Active);
        let view = controller.view(Some(&active)).await;
        assert!(view.reports.is_empty());
        assert_eq!(view.statistics.total_active, 0);

        let backend = store.list_reports().await.unwrap();
        assert!(backend.iter().all(|r| r.resolved));
    }

    #[tokio::test]
    async fn test_resolve_failure_records_update_error() {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let (controller, _hub) = controller(Arc::clone(&store));
        controller.refresh().await.unwrap();

        let err = controller.resolve(&ReportId::Int(99)).await.unwrap_err();
        assert!(matches!(err, DashboardError::Update { id: ReportId::Int(99), .. }));

        let view = controller.view(None).await;
        assert_eq!(view.phase, LoadPhase::Error);
        // Nothing rolled back or dropped
        assert_eq!(view.reports.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_without_refetch() {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let settings = ControllerSettings {
            refetch_after_resolve: false,
            ..ControllerSettings::default()
        };
        let controller = DashboardController::new(store.clone(), hub, settings);
        controller.refresh().await.unwrap();

        // Backend gains a report the local copy does not know about yet
        store.insert(Report::new(3, "new", "Small Leak")).await;
        controller.resolve(&ReportId::Int(1)).await.unwrap();

        let dash = controller.snapshot().await;
        assert_eq!(dash.reports().len(), 2);
        assert!(dash.reports()[0].resolved);
    }

    #[tokio::test]
    async fn test_tick_moves_clock_only() {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let (controller, _hub) = controller(store);
        controller.refresh().await.unwrap();
        let before = controller.snapshot().await;

        controller.tick().await;
        let after = controller.snapshot().await;
        assert_eq!(before.reports(), after.reports());
        assert!(after.last_updated() >= before.last_updated());
    }

    #[tokio::test]
    async fn test_session_filters() {
        let store = Arc::new(MemoryStore::with_reports(sample()));
        let (controller, _hub) = controller(store);
        controller.refresh().await.unwrap();

        controller
            .set_filters(FilterState::default().district("District B"))
            .await;
        let view = controller.view(None).await;
        assert_eq!(view.reports.len(), 1);
        assert_eq!(view.reports[0].id, ReportId::Int(2));
        assert_eq!(view.statistics.total, 2);
    }
}
