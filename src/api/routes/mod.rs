//! API Routes
//!
//! Route handlers organized by functionality.

pub mod dashboard;
pub mod filters;
pub mod health;
pub mod page;
pub mod reports;

use crate::api::error::{ApiError, ApiResult};
use crate::report::ReportId;

/// Report id from a path segment; numeric ids become integers
pub(crate) fn parse_report_id(raw: &str) -> ApiResult<ReportId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::Validation("report id must not be empty".to_string()));
    }
    match raw.parse::<ReportId>() {
        Ok(id) => Ok(id),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_id() {
        assert_eq!(parse_report_id("42").unwrap(), ReportId::Int(42));
        assert_eq!(
            parse_report_id("7f3c-uuid").unwrap(),
            ReportId::Text("7f3c-uuid".to_string())
        );
        assert!(parse_report_id(" ").is_err());
    }
}
