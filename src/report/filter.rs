//! Filter engine
//!
//! Stable selection of reports matching the active `FilterState`. The output
//! is always an ordered subsequence of the input.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;

use super::severity::Severity;
use super::time::creation_date;
use super::types::{DateRange, FilterState, Report, StatusFilter};

/// Select the reports matching every filter, preserving input order
pub fn apply_filters<'a>(reports: &'a [Report], filters: &FilterState) -> Vec<&'a Report> {
    reports.iter().filter(|r| filters.matches(r)).collect()
}

impl FilterState {
    /// Logical AND of the status, severity, district and date predicates
    pub fn matches(&self, report: &Report) -> bool {
        self.status.matches(report.resolved)
            && self.severities.contains(&report.severity())
            && self.district.matches(&report.district)
            && self
                .date_range
                .contains(creation_date(report.created_at.as_deref()))
    }

    /// Build filters from loosely-typed query values.
    ///
    /// Absent values keep the defaults. `severity` is a comma-separated list;
    /// an empty list selects no severities.
    pub fn from_params(
        status: Option<&str>,
        severity: Option<&str>,
        district: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, FilterParseError> {
        let mut filters = FilterState::default();

        if let Some(status) = status {
            filters.status = status
                .parse::<StatusFilter>()
                .map_err(FilterParseError::Status)?;
        }

        if let Some(severity) = severity {
            filters.severities = parse_severities(severity)?;
        }

        if let Some(district) = district {
            filters.district = district.trim().into();
        }

        filters.date_range = DateRange {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        };

        Ok(filters)
    }

    /// Encode as query parameters that `from_params` reads back unchanged
    pub fn to_query_string(&self) -> String {
        let severities = self
            .severities
            .iter()
            .map(Severity::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let district: String = self.district.clone().into();

        let mut params = vec![
            format!("status={}", self.status.as_str().to_lowercase()),
            format!("severity={}", urlencoding::encode(&severities)),
            format!("district={}", urlencoding::encode(&district)),
        ];
        if let Some(start) = self.date_range.start {
            params.push(format!("start={}", start.format("%Y-%m-%d")));
        }
        if let Some(end) = self.date_range.end {
            params.push(format!("end={}", end.format("%Y-%m-%d")));
        }
        params.join("&")
    }
}

/// Distinct districts present in the report set, sorted
pub fn districts(reports: &[Report]) -> Vec<String> {
    reports
        .iter()
        .filter(|r| !r.district.is_empty())
        .map(|r| r.district.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn parse_severities(raw: &str) -> Result<BTreeSet<Severity>, FilterParseError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Severity>().map_err(FilterParseError::Severity))
        .collect()
}

fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDate>, FilterParseError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FilterParseError::Date(s.to_string())),
    }
}

/// Invalid filter input
#[derive(Debug, Error, PartialEq)]
pub enum FilterParseError {
    #[error("Invalid status filter: {0}")]
    Status(String),

    #[error("Invalid severity filter: {0}")]
    Severity(String),

    #[error("Invalid date {0}, expected YYYY-MM-DD")]
    Date(String),
}
