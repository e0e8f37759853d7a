//! Report and filter types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::severity::Severity;

/// Identifier of a report as issued by the backend.
///
/// The hosted table may key rows by a serial integer or by text (UUID);
/// both forms round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportId::Int(id) => write!(f, "{}", id),
            ReportId::Text(id) => f.write_str(id),
        }
    }
}

impl FromStr for ReportId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(id) => ReportId::Int(id),
            Err(_) => ReportId::Text(s.to_string()),
        })
    }
}

impl From<i64> for ReportId {
    fn from(id: i64) -> Self {
        ReportId::Int(id)
    }
}

impl From<i32> for ReportId {
    fn from(id: i32) -> Self {
        ReportId::Int(id.into())
    }
}

impl From<&str> for ReportId {
    fn from(id: &str) -> Self {
        ReportId::Text(id.to_string())
    }
}

/// One leak incident record.
///
/// Field names follow the backend schema, including the capitalized
/// `Description` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub leak_type: String,
    /// Raw ISO 8601 text; may be missing or malformed
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub district: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Report {
    pub fn new(id: impl Into<ReportId>, address: impl Into<String>, leak_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            leak_type: leak_type.into(),
            created_at: None,
            resolved: false,
            district: String::new(),
            description: None,
        }
    }

    pub fn created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn district(mut self, district: impl Into<String>) -> Self {
        self.district = district.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn resolved(mut self, resolved: bool) -> Self {
        self.resolved = resolved;
        self
    }

    /// Severity derived from the leak type
    pub fn severity(&self) -> Severity {
        super::severity::classify(&self.leak_type)
    }
}

/// Status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Resolved,
}

impl StatusFilter {
    pub fn matches(&self, resolved: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !resolved,
            StatusFilter::Resolved => resolved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Resolved => "Resolved",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "resolved" => Ok(StatusFilter::Resolved),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

/// District filter: everything, or one exact district name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistrictFilter {
    #[default]
    All,
    Named(String),
}

impl DistrictFilter {
    pub fn matches(&self, district: &str) -> bool {
        match self {
            DistrictFilter::All => true,
            DistrictFilter::Named(name) => name == district,
        }
    }
}

impl From<String> for DistrictFilter {
    fn from(s: String) -> Self {
        if s.is_empty() || s == "All" {
            DistrictFilter::All
        } else {
            DistrictFilter::Named(s)
        }
    }
}

impl From<&str> for DistrictFilter {
    fn from(s: &str) -> Self {
        DistrictFilter::from(s.to_string())
    }
}

impl From<DistrictFilter> for String {
    fn from(filter: DistrictFilter) -> Self {
        match filter {
            DistrictFilter::All => "All".to_string(),
            DistrictFilter::Named(name) => name,
        }
    }
}

/// Inclusive calendar-date range. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a report's creation date falls in range.
    ///
    /// A report without a usable date only matches an unbounded range.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Active filter selections for the report table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default = "all_severities")]
    pub severities: BTreeSet<Severity>,
    #[serde(default)]
    pub district: DistrictFilter,
    #[serde(default)]
    pub date_range: DateRange,
}

fn all_severities() -> BTreeSet<Severity> {
    Severity::ALL.into_iter().collect()
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            severities: all_severities(),
            district: DistrictFilter::All,
            date_range: DateRange::unbounded(),
        }
    }
}

impl FilterState {
    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn severities(mut self, severities: impl IntoIterator<Item = Severity>) -> Self {
        self.severities = severities.into_iter().collect();
        self
    }

    pub fn district(mut self, district: impl Into<DistrictFilter>) -> Self {
        self.district = district.into();
        self
    }

    pub fn date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    /// True when no report can be excluded by these selections
    pub fn is_identity(&self) -> bool {
        self.status == StatusFilter::All
            && self.severities.len() == Severity::ALL.len()
            && self.district == DistrictFilter::All
            && self.date_range.is_unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_wire_names() {
        let json = r#"{
            "id": 1,
            "address": "123 Main St",
            "leak_type": "Burst Pipe",
            "created_at": "2025-06-07T10:00:00Z",
            "resolved": false,
            "district": "District A",
            "Description": "Severe water burst"
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.id, ReportId::Int(1));
        assert_eq!(report.leak_type, "Burst Pipe");
        assert_eq!(report.description.as_deref(), Some("Severe water burst"));

        let out = serde_json::to_value(&report).unwrap();
        assert_eq!(out["Description"], "Severe water burst");
        assert!(out.get("description").is_none());
    }

    #[test]
    fn test_report_tolerates_missing_fields() {
        let json = r#"{"id": "7f1c", "created_at": null}"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.id, ReportId::Text("7f1c".to_string()));
        assert!(report.created_at.is_none());
        assert!(!report.resolved);
        assert!(report.description.is_none());
    }

    #[test]
    fn test_report_id_parse() {
        assert_eq!("42".parse::<ReportId>().unwrap(), ReportId::Int(42));
        assert_eq!(
            "a1b2".parse::<ReportId>().unwrap(),
            ReportId::Text("a1b2".to_string())
        );
        assert_eq!(ReportId::Int(42).to_string(), "42");
    }

    #[test]
    fn test_status_filter() {
        assert!(StatusFilter::All.matches(true));
        assert!(StatusFilter::Active.matches(false));
        assert!(!StatusFilter::Active.matches(true));
        assert!(StatusFilter::Resolved.matches(true));
        assert_eq!("ACTIVE".parse::<StatusFilter>().unwrap(), StatusFilter::Active);
        assert!("open".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_district_filter_serde() {
        let all: DistrictFilter = serde_json::from_str("\"All\"").unwrap();
        assert_eq!(all, DistrictFilter::All);
        let named: DistrictFilter = serde_json::from_str("\"District A\"").unwrap();
        assert!(named.matches("District A"));
        assert!(!named.matches("District B"));
        assert_eq!(serde_json::to_string(&DistrictFilter::All).unwrap(), "\"All\"");
    }

    #[test]
    fn test_date_range_contains() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let range = DateRange::new(d("2025-06-01"), d("2025-06-07"));

        assert!(range.contains(Some(d("2025-06-01"))));
        assert!(range.contains(Some(d("2025-06-07"))));
        assert!(!range.contains(Some(d("2025-06-08"))));
        assert!(!range.contains(None));

        let open_end = DateRange {
            start: Some(d("2025-06-01")),
            end: None,
        };
        assert!(open_end.contains(Some(d("2030-01-01"))));
        assert!(!open_end.contains(None));

        assert!(DateRange::unbounded().contains(None));
    }

    #[test]
    fn test_default_filter_is_identity() {
        assert!(FilterState::default().is_identity());
        assert!(!FilterState::default().status(StatusFilter::Active).is_identity());
        assert!(!FilterState::default()
            .severities([Severity::Critical])
            .is_identity());
    }
}
