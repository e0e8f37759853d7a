//! Statistics aggregator
//!
//! Counters shown on the dashboard stat cards. Recomputed from the full
//! report set on every render.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::severity::Severity;
use super::time::creation_date;
use super::types::Report;

/// Aggregate counts over a report set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Reports not yet resolved
    pub total_active: usize,
    /// Resolved reports created on `today`
    pub resolved_today: usize,
    /// Unresolved reports classified Critical
    pub critical_active: usize,
    /// All reports
    pub total: usize,
    /// All resolved reports
    pub resolved: usize,
}

/// Compute statistics for `reports` relative to the UTC date `today`.
///
/// Reports whose `created_at` cannot be parsed never count towards
/// `resolved_today`.
pub fn compute_statistics(reports: &[Report], today: NaiveDate) -> Statistics {
    reports.iter().fold(Statistics::default(), |mut stats, report| {
        stats.total += 1;
        if report.resolved {
            stats.resolved += 1;
            if creation_date(report.created_at.as_deref()) == Some(today) {
                stats.resolved_today += 1;
            }
        } else {
            stats.total_active += 1;
            if report.severity() == Severity::Critical {
                stats.critical_active += 1;
            }
        }
        stats
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
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
    fn test_two_report_scenario() {
        let stats = compute_statistics(&sample(), d("2025-06-07"));
        assert_eq!(stats.total_active, 1);
        assert_eq!(stats.critical_active, 1);
        assert_eq!(stats.resolved_today, 0);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_resolved_today_uses_creation_date() {
        let stats = compute_statistics(&sample(), d("2025-06-06"));
        assert_eq!(stats.resolved_today, 1);
    }

    #[test]
    fn test_resolved_critical_is_not_critical_active() {
        let reports = vec![Report::new(1, "a", "Burst Pipe").resolved(true)];
        let stats = compute_statistics(&reports, d("2025-06-07"));
        assert_eq!(stats.critical_active, 0);
        assert_eq!(stats.total_active, 0);
    }

    #[test]
    fn test_bad_timestamps_never_count_today() {
        let reports = vec![
            Report::new(1, "a", "Small Leak").created_at("").resolved(true),
            Report::new(2, "b", "Small Leak").created_at("??").resolved(true),
            Report::new(3, "c", "Small Leak").resolved(true),
        ];
        let stats = compute_statistics(&reports, d("2025-06-07"));
        assert_eq!(stats.resolved_today, 0);
        assert_eq!(stats.resolved, 3);
    }

    #[test]
    fn test_active_plus_resolved_is_total() {
        let reports: Vec<Report> = (0..37)
            .map(|i: i64| Report::new(i, "x", "Broken Valve").resolved(i % 3 == 0))
            .collect();
        let stats = compute_statistics(&reports, d("2025-06-07"));
        assert_eq!(stats.total_active + stats.resolved, stats.total);
        assert_eq!(stats.total, reports.len());
    }

    #[test]
    fn test_order_independent() {
        let mut reports = sample();
        let forward = compute_statistics(&reports, d("2025-06-06"));
        reports.reverse();
        assert_eq!(compute_statistics(&reports, d("2025-06-06")), forward);
    }

    #[test]
    fn test_empty() {
        assert_eq!(compute_statistics(&[], d("2025-06-07")), Statistics::default());
    }
}
