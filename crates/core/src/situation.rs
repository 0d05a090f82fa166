//! Frozen-device detection over the most recent log groups.

use serde::{Deserialize, Serialize};

/// Number of most recent groups compared.
pub const FROZEN_WINDOW: usize = 5;

/// Keys ignored when comparing reading payloads.
const VOLATILE_KEYS: &[&str] = &["timestamp", "id", "id_grupo", "alarm", "alarm_type"];

/// Whether a device is still reporting changing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Situation {
    Working,
    Frozen,
}

fn strip_volatile(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .filter(|(key, _)| !VOLATILE_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), strip_volatile(value)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(strip_volatile).collect())
        }
        other => other.clone(),
    }
}

/// Classify a device from the `logs` payloads of its most recent groups.
///
/// Fewer than [`FROZEN_WINDOW`] groups is always `Working`. Otherwise the
/// newest [`FROZEN_WINDOW`] payloads must be identical once volatile keys
/// are removed.
pub fn detect(recent_payloads: &[serde_json::Value]) -> Situation {
    if recent_payloads.len() < FROZEN_WINDOW {
        return Situation::Working;
    }

    let mut stripped = recent_payloads[..FROZEN_WINDOW].iter().map(strip_volatile);
    let Some(first) = stripped.next() else {
        return Situation::Working;
    };

    if stripped.all(|payload| payload == first) {
        Situation::Frozen
    } else {
        Situation::Working
    }
}
