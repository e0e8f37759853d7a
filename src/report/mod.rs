//! Leak Reports
//!
//! The report record and the pure functions computed over it:
//!
//! - **types**: `Report`, `ReportId` and the filter state types
//! - **severity**: leak-type label to severity classification
//! - **filter**: stable filtering by status, severity, district and date range
//! - **stats**: aggregate counters for the stat cards
//! - **time**: tolerant parsing and formatting of `created_at`
//!
//! Nothing in here performs I/O. The dashboard owns the report sequence and
//! passes it by reference.

mod filter;
mod severity;
mod stats;
mod time;
mod types;

pub use filter::{apply_filters, districts, FilterParseError};
pub use severity::{classify, Severity};
pub use stats::{compute_statistics, Statistics};
pub use time::{creation_date, format_reported, parse_timestamp};
pub use types::{DateRange, DistrictFilter, FilterState, Report, ReportId, StatusFilter};
