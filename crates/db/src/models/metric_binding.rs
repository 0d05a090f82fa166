//! Metrics and their per-equipment bindings.

use equiplog_core::alarm::AlarmThresholds;
use equiplog_core::conversion::ConversionRange;
use equiplog_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `metrics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Metric {
    pub id: DbId,
    pub name: String,
    pub unit: String,
}

/// DTO for creating a metric.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMetric {
    pub name: String,
    pub unit: String,
}

/// A row from `equipment_metrics` joined with its metric's name and unit.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MetricBinding {
    pub id: DbId,
    pub equipment_id: DbId,
    pub metric_id: DbId,
    pub valor_minimo: f64,
    pub valor_maximo: f64,
    pub alarme_minimo: Option<f64>,
    pub alarme_maximo: Option<f64>,
    pub metric_name: String,
    pub metric_unit: String,
}

impl MetricBinding {
    pub fn range(&self) -> ConversionRange {
        ConversionRange::new(self.valor_minimo, self.valor_maximo)
    }

    pub fn thresholds(&self) -> AlarmThresholds {
        AlarmThresholds {
            min: self.alarme_minimo,
            max: self.alarme_maximo,
        }
    }
}

/// DTO for binding a metric to equipment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMetricBinding {
    pub equipment_id: DbId,
    pub metric_id: DbId,
    pub valor_minimo: f64,
    pub valor_maximo: f64,
    pub alarme_minimo: Option<f64>,
    pub alarme_maximo: Option<f64>,
}
