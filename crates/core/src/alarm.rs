//! Alarm threshold classification for converted readings.
//!
//! The same [`classify`] is used when notifying on ingestion and when
//! annotating rows for table rendering, so both always agree.

use serde::{Deserialize, Serialize};

use crate::conversion::ConversionRange;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Which threshold a reading crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmKind {
    Min,
    Max,
}

impl AlarmKind {
    /// Lowercase wire name (`"min"` / `"max"`).
    pub fn as_str(self) -> &'static str {
        match self {
            AlarmKind::Min => "min",
            AlarmKind::Max => "max",
        }
    }

    /// Upper-case label used in notification text.
    pub fn label(self) -> &'static str {
        match self {
            AlarmKind::Min => "MINIMUM",
            AlarmKind::Max => "MAXIMUM",
        }
    }
}

/// Optional alarm thresholds of a binding (`alarme_minimo` / `alarme_maximo`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlarmThresholds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Classify a converted value against the thresholds.
///
/// Both bounds are inclusive. Min is checked first and max last, so max
/// wins when a misconfigured binding satisfies both.
pub fn classify(value: f64, thresholds: &AlarmThresholds) -> Option<AlarmKind> {
    let mut kind = None;

    if let Some(min) = thresholds.min {
        if value <= min {
            kind = Some(AlarmKind::Min);
        }
    }

    if let Some(max) = thresholds.max {
        if value >= max {
            kind = Some(AlarmKind::Max);
        }
    }

    kind
}

/// Reject binding configurations that make classification ambiguous.
pub fn validate_thresholds(range: ConversionRange, thresholds: &AlarmThresholds) -> Result<(), CoreError> {
    if range.min > range.max {
        return Err(CoreError::Validation(format!(
            "valor_minimo ({}) must not exceed valor_maximo ({})",
            range.min, range.max
        )));
    }
    if let (Some(min), Some(max)) = (thresholds.min, thresholds.max) {
        if min > max {
            return Err(CoreError::Validation(format!(
                "alarme_minimo ({min}) must not exceed alarme_maximo ({max})"
            )));
        }
    }
    Ok(())
}

/// Human-readable notification text for a fired alarm.
pub fn describe_alarm(
    kind: AlarmKind,
    equipment_name: &str,
    metric_name: Option<&str>,
    unit: Option<&str>,
    value: f64,
    timestamp: Timestamp,
) -> String {
    format!(
        "{} alarm: equipment \"{}\" - metric \"{}\" at {:.2} {} ({})",
        kind.label(),
        equipment_name,
        metric_name.unwrap_or("Unknown"),
        value,
        unit.unwrap_or(""),
        timestamp.format("%d/%m/%Y %H:%M:%S"),
    )
}
