//! Server-side timestamp normalization for log groups.

use chrono::{Duration, Utc};

use crate::types::Timestamp;

/// Default offset applied to stored group timestamps (UTC-3).
pub const DEFAULT_OFFSET_HOURS: i64 = -3;

/// Shift an instant by a fixed number of hours.
///
/// Stored group timestamps are wall-clock values of the configured zone
/// recorded in a UTC column, so this is a plain shift, not a zone change.
pub fn normalize_to_offset(instant: Timestamp, offset_hours: i64) -> Timestamp {
    instant + Duration::hours(offset_hours)
}

/// The current instant, normalized.
pub fn now_with_offset(offset_hours: i64) -> Timestamp {
    normalize_to_offset(Utc::now(), offset_hours)
}
