//! Batch ingestion: conversion, persistence and alarm publication.

use std::sync::Arc;

use equiplog_core::alarm;
use equiplog_core::batch::{LogBatch, StoredReading};
use equiplog_core::conversion;
use equiplog_core::time::now_with_offset;
use equiplog_core::types::{DbId, Timestamp};
use equiplog_db::models::log_group::{LogGroup, UpdateLogGroup};
use equiplog_db::models::metric_binding::MetricBinding;
use equiplog_db::repositories::{LogGroupRepo, MetricBindingRepo};
use equiplog_db::DbPool;
use equiplog_events::{AlarmRaised, EventBus};
use serde::Serialize;

use crate::config::IngestionConfig;
use crate::error::PipelineError;

/// Result of ingesting one batch.
#[derive(Debug, Clone, Serialize)]
pub struct IngestedBatch {
    #[serde(flatten)]
    pub group: LogGroup,
    #[serde(skip)]
    pub alarms: Vec<AlarmRaised>,
}

/// Converts and stores batches. Cheap to clone.
#[derive(Clone)]
pub struct IngestionService {
    pool: DbPool,
    event_bus: Arc<EventBus>,
    config: IngestionConfig,
}

impl IngestionService {
    pub fn new(pool: DbPool, event_bus: Arc<EventBus>, config: IngestionConfig) -> Self {
        Self {
            pool,
            event_bus,
            config,
        }
    }

    /// Persist `batch` as one log group.
    ///
    /// Returns `None` when the batch names no equipment. The group row and
    /// its readings are written in a single transaction; alarm events are
    /// published only after commit and never affect the result.
    pub async fn ingest(
        &self,
        batch: &LogBatch,
        tenant_id: Option<DbId>,
    ) -> Result<Option<IngestedBatch>, PipelineError> {
        let Some(equipment_id) = batch.equipment_id() else {
            tracing::debug!("Batch has no equipment id, skipping");
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;

        let bindings = MetricBindingRepo::list_for_equipment(&mut *tx, equipment_id).await?;
        let timestamp = now_with_offset(self.config.timestamp_offset_hours);
        let group = LogGroupRepo::create_group(&mut tx, equipment_id, tenant_id, timestamp).await?;

        let readings = convert_readings(batch, equipment_id, &bindings, timestamp);
        let group = LogGroupRepo::update_group(
            &mut tx,
            group.id,
            &UpdateLogGroup {
                logs: readings.clone(),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            equipment_id,
            group_id = group.id,
            readings = readings.len(),
            "Log batch ingested"
        );

        let alarms = evaluate_alarms(group.id, &readings, &bindings);
        for alarm in &alarms {
            tracing::debug!(
                equipment_id,
                metric_id = alarm.metric_id,
                kind = alarm.kind.as_str(),
                value = alarm.value,
                "Alarm raised"
            );
            self.event_bus.publish(alarm.clone().into_event());
        }

        Ok(Some(IngestedBatch { group, alarms }))
    }
}

/// Convert each reading with its metric's binding.
///
/// Unbound readings keep their raw value and any supplied converted value
/// (rounded like a bound pass-through), and carry no binding id. Readings without a timestamp get the group's.
pub fn convert_readings(
    batch: &LogBatch,
    equipment_id: DbId,
    bindings: &[MetricBinding],
    group_timestamp: Timestamp,
) -> Vec<StoredReading> {
    batch
        .logs
        .iter()
        .map(|reading| {
            let binding = bindings.iter().find(|b| b.metric_id == reading.id_metrica);
            let valor_convertido = match binding {
                Some(binding) => Some(conversion::convert(
                    reading.valor,
                    reading.valor_convertido,
                    binding.range(),
                )),
                None => reading.valor_convertido.map(conversion::round2),
            };
            StoredReading {
                id_metrica: reading.id_metrica,
                id_equipamento: reading.id_equipamento.unwrap_or(equipment_id),
                valor: reading.valor,
                valor_convertido,
                id_equipamento_metrica: binding.map(|b| b.id),
                timestamp: reading.timestamp.unwrap_or(group_timestamp),
            }
        })
        .collect()
}

/// Classify every bound, converted reading against its thresholds.
pub fn evaluate_alarms(
    group_id: DbId,
    readings: &[StoredReading],
    bindings: &[MetricBinding],
) -> Vec<AlarmRaised> {
    readings
        .iter()
        .filter_map(|reading| {
            let binding_id = reading.id_equipamento_metrica?;
            let binding = bindings.iter().find(|b| b.id == binding_id)?;
            let value = reading.valor_convertido?;
            let kind = alarm::classify(value, &binding.thresholds())?;
            Some(AlarmRaised {
                equipment_id: reading.id_equipamento,
                group_id,
                metric_id: reading.id_metrica,
                metric_name: binding.metric_name.clone(),
                metric_unit: binding.metric_unit.clone(),
                kind,
                value,
                timestamp: reading.timestamp,
            })
        })
        .collect()
}
