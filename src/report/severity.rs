//! Severity classification
//!
//! Maps the backend's free-text `leak_type` label onto one of three
//! severities. Unknown labels fall back to `Minor` so new categories stay
//! visible under the default filters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Derived severity of a leak report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Moderate,
    Minor,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Moderate, Severity::Minor];

    /// Display name, also the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Moderate => "Moderate",
            Severity::Minor => "Minor",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "moderate" => Ok(Severity::Moderate),
            "minor" => Ok(Severity::Minor),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Classify a leak-type label.
///
/// Total over all inputs; anything not in the known set is `Minor`.
pub fn classify(leak_type: &str) -> Severity {
    match leak_type {
        "Burst Pipe" => Severity::Critical,
        "Moderate Leak" | "Broken Valve" => Severity::Moderate,
        "Minor Leak" | "Small Leak" => Severity::Minor,
        _ => Severity::Minor,
    }
}
