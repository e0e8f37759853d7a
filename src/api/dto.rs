//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON, and the CLI
//! reads them back with the same definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::{
    format_reported, FilterParseError, FilterState, Report, ReportId, Severity, Statistics,
};

// ============================================
// FILTER DTOs
// ============================================

/// Filter selections from the query string
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilterQuery {
    /// all | active | resolved
    pub status: Option<String>,
    /// Comma-separated severities; empty selects none
    pub severity: Option<String>,
    /// "All" or a district name
    pub district: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub start: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub end: Option<String>,
}

impl FilterQuery {
    /// True when no filter parameter was supplied
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.severity.is_none()
            && self.district.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    /// Explicit filters, or `None` to use the session filters
    pub fn to_filters(&self) -> Result<Option<FilterState>, FilterParseError> {
        if self.is_empty() {
            return Ok(None);
        }
        FilterState::from_params(
            self.status.as_deref(),
            self.severity.as_deref(),
            self.district.as_deref(),
            self.start.as_deref(),
            self.end.as_deref(),
        )
        .map(Some)
    }
}

// ============================================
// REPORT DTOs
// ============================================

/// One table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDto {
    pub id: ReportId,
    pub address: String,
    pub leak_type: String,
    pub severity: Severity,
    pub created_at: Option<String>,
    /// `YYYY-MM-DD HH:MM`, empty when the timestamp is unusable
    pub reported: String,
    pub resolved: bool,
    pub district: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Report> for ReportDto {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            address: report.address.clone(),
            leak_type: report.leak_type.clone(),
            severity: report.severity(),
            created_at: report.created_at.clone(),
            reported: format_reported(report.created_at.as_deref()),
            resolved: report.resolved,
            district: report.district.clone(),
            description: report.description.clone(),
        }
    }
}

/// Filtered report list
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportsResponse {
    pub count: usize,
    pub filters: FilterState,
    pub reports: Vec<ReportDto>,
}

/// Stat card values
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub avg_response_time: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Resolve outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub id: ReportId,
    /// "resolved"
    pub status: String,
}

/// Manual refresh outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub count: usize,
    pub statistics: Statistics,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// healthy | degraded | starting
    pub status: String,
    /// Store backend name
    pub store: String,
    /// Dashboard load phase
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub ws_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
