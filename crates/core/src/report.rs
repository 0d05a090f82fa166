//! Report request validation.
//!
//! Report files themselves are produced elsewhere; this module only checks
//! the request and defines the queued message.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Widest date range a single report or table query may span.
pub const MAX_RANGE_DAYS: i64 = 30;

/// Estimated processing minutes per requested day.
const MINUTES_PER_DAY: f64 = 0.5;

/// Output format of a generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Xlsx,
    Pdf,
}

impl std::str::FromStr for ReportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xlsx" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            other => Err(CoreError::Validation(format!(
                "format must be \"xlsx\" or \"pdf\", got \"{other}\""
            ))),
        }
    }
}

/// Message placed on the report queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub id_equipamento: DbId,
    pub user_id: DbId,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub format: ReportFormat,
    pub email: Option<String>,
}

/// Whole days spanned by `[start, end]`, rounded up.
pub fn span_days(start: Timestamp, end: Timestamp) -> i64 {
    let seconds = (end - start).num_seconds();
    (seconds + 86_399).div_euclid(86_400)
}

/// Check that `start <= end` and the range is at most [`MAX_RANGE_DAYS`].
///
/// Returns the number of days spanned.
pub fn validate_range(start: Timestamp, end: Timestamp) -> Result<i64, CoreError> {
    if start > end {
        return Err(CoreError::Validation(
            "startDate must not be after endDate".into(),
        ));
    }
    let days = span_days(start, end);
    if days > MAX_RANGE_DAYS {
        return Err(CoreError::Validation(format!(
            "Date range must not exceed {MAX_RANGE_DAYS} days"
        )));
    }
    Ok(days)
}

/// Estimated processing time in minutes for a range of `days`.
pub fn estimated_minutes(days: i64) -> i64 {
    (days as f64 * MINUTES_PER_DAY).ceil() as i64
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn day(d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn thirty_days_is_accepted() {
        assert_eq!(validate_range(day(1), day(31)).unwrap(), 30);
    }

    #[test]
    fn partial_day_rounds_up() {
        assert_eq!(span_days(day(1), day(1) + Duration::hours(1)), 1);
        assert_eq!(span_days(day(1), day(1)), 0);
    }

    #[test]
    fn over_thirty_days_is_rejected() {
        let end = day(31) + Duration::minutes(1);
        assert_matches!(validate_range(day(1), end), Err(CoreError::Validation(_)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_matches!(validate_range(day(5), day(1)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn estimate_is_half_a_minute_per_day_rounded_up() {
        assert_eq!(estimated_minutes(7), 4);
        assert_eq!(estimated_minutes(30), 15);
        assert_eq!(estimated_minutes(0), 0);
    }

    #[test]
    fn format_parsing() {
        assert_eq!("pdf".parse::<ReportFormat>().unwrap(), ReportFormat::Pdf);
        assert!("csv".parse::<ReportFormat>().is_err());
    }
}
