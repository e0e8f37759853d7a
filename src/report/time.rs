//! Timestamp helpers
//!
//! `created_at` arrives as text and may be missing, empty, or malformed.
//! Parsing never fails loudly: an unusable timestamp is `None` and the report
//! simply drops out of every date-based computation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a backend timestamp into UTC.
///
/// Accepts RFC 3339 (`2025-06-07T10:00:00Z`, `...+00:00`), naive date-times
/// as written by Postgres `timestamp` columns (taken as UTC), and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Postgres text output uses a space separator and a short offset
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// UTC calendar date of a creation timestamp
pub fn creation_date(created_at: Option<&str>) -> Option<NaiveDate> {
    created_at
        .and_then(parse_timestamp)
        .map(|dt| dt.date_naive())
}

/// Format a creation timestamp for the "Reported" column (`YYYY-MM-DD HH:MM`).
///
/// Unusable timestamps render as an empty string.
pub fn format_reported(created_at: Option<&str>) -> String {
    created_at
        .and_then(parse_timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_timestamp("2025-06-07T10:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-07T10:00:00+00:00");

        let dt = parse_timestamp("2025-06-07T23:30:00-02:00").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2025, 6, 8).unwrap());
    }

    #[test]
    fn test_parse_postgres_forms() {
        assert!(parse_timestamp("2025-06-07 10:00:00.123456+00").is_some());
        assert!(parse_timestamp("2025-06-07T10:00:00.123456").is_some());
        assert!(parse_timestamp("2025-06-07").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2025-13-40T00:00:00Z").is_none());
    }

    #[test]
    fn test_format_reported() {
        assert_eq!(format_reported(Some("2025-06-06T14:30:00Z")), "2025-06-06 14:30");
        assert_eq!(format_reported(Some("not a date")), "");
        assert_eq!(format_reported(None), "");
    }

    #[test]
    fn test_creation_date() {
        assert_eq!(
            creation_date(Some("2025-06-07T10:00:00Z")),
            NaiveDate::from_ymd_opt(2025, 6, 7)
        );
        assert_eq!(creation_date(Some("")), None);
    }
}
