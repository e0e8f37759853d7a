//! Dashboard state machine
//!
//! Owns the in-memory report sequence, the active filters, the latest error
//! and the "last updated" clock. All transitions are synchronous; the
//! controller performs the network calls and feeds their results in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::report::{apply_filters, compute_statistics, districts, FilterState, Report, ReportId, Statistics};

/// Lifecycle of the report collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// No fetch has succeeded yet
    Loading,
    /// Last operation succeeded
    Loaded,
    /// Last fetch or update failed; reports are the last known set
    Error,
}

/// Failures surfaced on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardError {
    /// Initial load or re-fetch failed
    #[error("Failed to load reports: {message}")]
    Fetch { message: String },

    /// Resolve action failed
    #[error("Failed to resolve report {id}: {message}")]
    Update { id: ReportId, message: String },
}

/// Everything a renderer needs for one frame of the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub phase: LoadPhase,
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<DashboardError>,
    /// Computed over the full report set, not the filtered rows
    pub statistics: Statistics,
    pub avg_response_time: String,
    pub districts: Vec<String>,
    pub filters: FilterState,
    pub reports: Vec<Report>,
}

/// Session-owned dashboard state
#[derive(Debug, Clone)]
pub struct Dashboard {
    reports: Vec<Report>,
    filters: FilterState,
    phase: LoadPhase,
    last_error: Option<DashboardError>,
    last_updated: Option<DateTime<Utc>>,
    avg_response_time: String,
    loaded_once: bool,
}

impl Dashboard {
    pub fn new(filters: FilterState, avg_response_time: impl Into<String>) -> Self {
        Self {
            reports: Vec::new(),
            filters,
            phase: LoadPhase::Loading,
            last_error: None,
            last_updated: None,
            avg_response_time: avg_response_time.into(),
            loaded_once: false,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn last_error(&self) -> Option<&DashboardError> {
        self.last_error.as_ref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Whether a fetch has ever succeeded
    pub fn has_loaded(&self) -> bool {
        self.loaded_once
    }

    /// A fetch succeeded: replace the sequence wholesale
    pub fn apply_fetch(&mut self, reports: Vec<Report>, now: DateTime<Utc>) {
        self.reports = reports;
        self.phase = LoadPhase::Loaded;
        self.last_error = None;
        self.last_updated = Some(now);
        self.loaded_once = true;
    }

    /// A fetch failed: keep the last known set
    pub fn fetch_failed(&mut self, message: impl Into<String>) {
        self.phase = LoadPhase::Error;
        self.last_error = Some(DashboardError::Fetch {
            message: message.into(),
        });
    }

    /// The backend acknowledged a resolve: flip the flag on the local copy.
    ///
    /// Returns false when the id is not in the local set. Already-resolved
    /// reports are left untouched.
    pub fn apply_resolved(&mut self, id: &ReportId, now: DateTime<Utc>) -> bool {
        let Some(report) = self.reports.iter_mut().find(|r| &r.id == id) else {
            return false;
        };
        report.resolved = true;
        self.last_updated = Some(now);
        true
    }

    /// A resolve failed: nothing already applied is rolled back
    pub fn resolve_failed(&mut self, id: &ReportId, message: impl Into<String>) {
        self.phase = LoadPhase::Error;
        self.last_error = Some(DashboardError::Update {
            id: id.clone(),
            message: message.into(),
        });
    }

    /// Periodic tick: only the clock moves
    pub fn touch_clock(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }

    /// Statistics over the full report set
    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        compute_statistics(&self.reports, today)
    }

    /// Snapshot using the session filters
    pub fn view(&self, today: NaiveDate) -> DashboardView {
        self.view_with(&self.filters, today)
    }

    /// Snapshot using caller-supplied filters
    pub fn view_with(&self, filters: &FilterState, today: NaiveDate) -> DashboardView {
        DashboardView {
            phase: self.phase,
            last_updated: self.last_updated,
            error: self.last_error.clone(),
            statistics: self.statistics(today),
            avg_response_time: self.avg_response_time.clone(),
            districts: districts(&self.reports),
            filters: filters.clone(),
            reports: apply_filters(&self.reports, filters)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::StatusFilter;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 7, 12, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

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

    #[test]
    fn test_loading_to_loaded() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        assert_eq!(dash.phase(), LoadPhase::Loading);
        assert!(!dash.has_loaded());

        dash.apply_fetch(sample(), now());
        assert_eq!(dash.phase(), LoadPhase::Loaded);
        assert_eq!(dash.last_updated(), Some(now()));
        assert!(dash.has_loaded());
    }

    #[test]
    fn test_fetch_failure_keeps_reports() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.apply_fetch(sample(), now());
        dash.fetch_failed("connection refused");

        assert_eq!(dash.phase(), LoadPhase::Error);
        assert_eq!(dash.reports().len(), 2);
        assert_eq!(
            dash.last_error(),
            Some(&DashboardError::Fetch {
                message: "connection refused".to_string()
            })
        );
        assert!(dash.has_loaded());

        // Next successful fetch recovers and clears the error
        dash.apply_fetch(sample(), now());
        assert_eq!(dash.phase(), LoadPhase::Loaded);
        assert!(dash.last_error().is_none());
    }

    #[test]
    fn test_initial_fetch_failure() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.fetch_failed("boom");
        dash.touch_clock(now());
        assert_eq!(dash.phase(), LoadPhase::Error);
        assert!(!dash.has_loaded());
        assert!(dash.reports().is_empty());
    }

    #[test]
    fn test_resolve_then_active_filter_excludes() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.apply_fetch(sample(), now());

        assert!(dash.apply_resolved(&ReportId::Int(1), now()));
        assert!(dash.reports()[0].resolved);

        let view = dash.view_with(&FilterState::default().status(StatusFilter::Active), today());
        assert!(view.reports.is_empty());
        assert_eq!(view.statistics.total_active, 0);
        assert_eq!(view.statistics.critical_active, 0);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.apply_fetch(sample(), now());
        let before = dash.reports().to_vec();

        assert!(dash.apply_resolved(&ReportId::Int(2), now()));
        assert_eq!(dash.reports(), before.as_slice());
    }

    #[test]
    fn test_resolve_unknown_id() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.apply_fetch(sample(), now());
        assert!(!dash.apply_resolved(&ReportId::Int(42), now()));
    }

    #[test]
    fn test_resolve_failure_does_not_roll_back() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.apply_fetch(sample(), now());
        dash.apply_resolved(&ReportId::Int(1), now());

        dash.resolve_failed(&ReportId::Int(1), "timeout");
        assert_eq!(dash.phase(), LoadPhase::Error);
        assert!(dash.reports()[0].resolved);
        assert!(matches!(dash.last_error(), Some(DashboardError::Update { .. })));
    }

    #[test]
    fn test_tick_only_moves_clock() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.apply_fetch(sample(), now());
        let later = now() + chrono::Duration::seconds(60);

        dash.touch_clock(later);
        assert_eq!(dash.last_updated(), Some(later));
        assert_eq!(dash.reports(), sample().as_slice());
        assert_eq!(dash.phase(), LoadPhase::Loaded);
    }

    #[test]
    fn test_view_scenario() {
        let mut dash = Dashboard::new(FilterState::default(), "3.2 hours");
        dash.apply_fetch(sample(), now());

        let view = dash.view(today());
        assert_eq!(view.reports.len(), 2);
        assert_eq!(view.reports[0].id, ReportId::Int(1));
        assert_eq!(view.statistics.total_active, 1);
        assert_eq!(view.statistics.critical_active, 1);
        assert_eq!(view.avg_response_time, "3.2 hours");
        assert_eq!(view.districts, vec!["District A", "District B"]);
    }

    #[test]
    fn test_error_serialization() {
        let err = DashboardError::Update {
            id: ReportId::Int(3),
            message: "denied".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "update");
        assert_eq!(json["id"], 3);
        assert_eq!(err.to_string(), "Failed to resolve report 3: denied");
    }
}
