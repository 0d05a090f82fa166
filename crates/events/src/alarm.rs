//! Typed payload for alarm events.

use equiplog_core::alarm::AlarmKind;
use equiplog_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::bus::PlatformEvent;

/// Event name published for every reading that crosses a threshold.
pub const EVENT_EQUIPMENT_ALARM: &str = "equipment.alarm";

/// A converted reading that crossed one of its binding's thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRaised {
    pub equipment_id: DbId,
    pub group_id: DbId,
    pub metric_id: DbId,
    pub metric_name: String,
    pub metric_unit: String,
    pub kind: AlarmKind,
    pub value: f64,
    pub timestamp: Timestamp,
}

impl AlarmRaised {
    pub fn into_event(self) -> PlatformEvent {
        let equipment_id = self.equipment_id;
        let payload = serde_json::to_value(&self).unwrap_or_default();
        PlatformEvent::new(EVENT_EQUIPMENT_ALARM)
            .with_source("equipment", equipment_id)
            .with_payload(payload)
    }

    /// Decode an alarm from a bus event. `None` for other event types.
    pub fn from_event(event: &PlatformEvent) -> Option<Result<Self, serde_json::Error>> {
        if event.event_type != EVENT_EQUIPMENT_ALARM {
            return None;
        }
        Some(serde_json::from_value(event.payload.clone()))
    }
}
