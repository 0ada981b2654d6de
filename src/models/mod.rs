//! Shared data models spanning the pipeline layers.

pub mod analysis;
pub mod indicator;
pub mod job;

pub use analysis::{AnalysisKind, AnalysisResult, NewAnalysisResult};
pub use indicator::{
    Frequency, Indicator, IndicatorUpdate, IndicatorValue, NewIndicator, NewValue,
};
pub use job::{EtlJob, EtlJobUpdate, JobStatus, NewEtlJob};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a caller-supplied timestamp.
///
/// Accepts RFC 3339, ISO `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`, and
/// bare `YYYY-MM-DD` (midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}
