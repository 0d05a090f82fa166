//! Wire types for device log batches and their pre-processing validation.
//!
//! Field names follow the device protocol (`id_metrica`, `valor`, ...), so the
//! serde representation is the struct field names as written.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// One raw reading as sent by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogReading {
    pub id_metrica: DbId,
    /// Optional on the wire; filled from the authenticated device.
    #[serde(default)]
    pub id_equipamento: Option<DbId>,
    pub valor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_convertido: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// A batch of readings from one equipment at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LogBatch {
    #[validate(length(min = 1, message = "logs must contain at least one reading"))]
    pub logs: Vec<LogReading>,
}

impl LogBatch {
    /// Equipment id of the batch, taken from the first reading.
    pub fn equipment_id(&self) -> Option<DbId> {
        self.logs.first().and_then(|reading| reading.id_equipamento)
    }

    /// Metric ids present in the batch, in order.
    pub fn metric_ids(&self) -> Vec<DbId> {
        self.logs.iter().map(|reading| reading.id_metrica).collect()
    }
}

/// Structural validation: non-empty and no duplicate `id_metrica`.
///
/// Runs before anything is persisted or queued.
pub fn validate_batch(batch: &LogBatch) -> Result<(), CoreError> {
    batch
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let mut seen = HashSet::with_capacity(batch.logs.len());
    for reading in &batch.logs {
        if !seen.insert(reading.id_metrica) {
            return Err(CoreError::Validation(format!(
                "Duplicate id_metrica {} in batch",
                reading.id_metrica
            )));
        }
    }
    Ok(())
}

/// Bind every reading to the authenticated equipment.
///
/// Readings without an `id_equipamento` are assigned `equipment_id`; a
/// reading naming another equipment is a capability failure.
pub fn bind_to_equipment(batch: &mut LogBatch, equipment_id: DbId) -> Result<(), CoreError> {
    for reading in &mut batch.logs {
        match reading.id_equipamento {
            Some(id) if id != equipment_id => {
                return Err(CoreError::Forbidden(format!(
                    "Device is not allowed to submit readings for equipment {id}"
                )));
            }
            Some(_) => {}
            None => reading.id_equipamento = Some(equipment_id),
        }
    }
    Ok(())
}

/// A reading as persisted inside a log group's `logs` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id_metrica: DbId,
    pub id_equipamento: DbId,
    pub valor: f64,
    pub valor_convertido: Option<f64>,
    pub id_equipamento_metrica: Option<DbId>,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn reading(metric: DbId, equipment: Option<DbId>) -> LogReading {
        LogReading {
            id_metrica: metric,
            id_equipamento: equipment,
            valor: 1.0,
            valor_convertido: None,
            timestamp: None,
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let batch = LogBatch { logs: vec![] };
        assert_matches!(validate_batch(&batch), Err(CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_metric_is_rejected() {
        let batch = LogBatch {
            logs: vec![reading(1, Some(9)), reading(2, Some(9)), reading(1, Some(9))],
        };
        let err = validate_batch(&batch).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("id_metrica 1"));
    }

    #[test]
    fn distinct_metrics_pass() {
        let batch = LogBatch {
            logs: vec![reading(1, Some(9)), reading(2, Some(9))],
        };
        assert!(validate_batch(&batch).is_ok());
        assert_eq!(batch.equipment_id(), Some(9));
        assert_eq!(batch.metric_ids(), vec![1, 2]);
    }

    #[test]
    fn missing_equipment_ids_are_filled() {
        let mut batch = LogBatch {
            logs: vec![reading(1, None), reading(2, Some(4))],
        };
        bind_to_equipment(&mut batch, 4).unwrap();
        assert!(batch.logs.iter().all(|r| r.id_equipamento == Some(4)));
    }

    #[test]
    fn foreign_equipment_is_forbidden() {
        let mut batch = LogBatch {
            logs: vec![reading(1, Some(4)), reading(2, Some(5))],
        };
        assert_matches!(bind_to_equipment(&mut batch, 4), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn wire_format_uses_protocol_field_names() {
        let batch: LogBatch = serde_json::from_value(serde_json::json!({
            "logs": [{ "id_metrica": 3, "id_equipamento": 7, "valor": 2047 }]
        }))
        .unwrap();
        assert_eq!(batch.logs[0].id_metrica, 3);
        assert_eq!(batch.logs[0].valor, 2047.0);
        assert!(batch.logs[0].valor_convertido.is_none());
    }
}
