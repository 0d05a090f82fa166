//! Shaping of log groups into a data-grid table.
//!
//! Each group becomes one row keyed `metrica_<id>`; rows also carry a
//! `metrica_<id>_alarm` annotation computed with [`alarm::classify`], the
//! same function ingestion uses to fire notifications.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::alarm::{self, AlarmThresholds};
use crate::batch::StoredReading;
use crate::pagination::PageInfo;
use crate::situation::Situation;
use crate::types::{DbId, Timestamp};

/// Column descriptor consumed by the front-end grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub field: String,
    pub header_name: String,
    pub flex: u32,
    pub disable_column_menu: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl TableColumn {
    fn new(field: String, header_name: String, kind: &'static str) -> Self {
        Self {
            field,
            header_name,
            flex: 1,
            disable_column_menu: true,
            kind,
        }
    }
}

/// A bound metric as needed for table rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMetric {
    pub id_metrica: DbId,
    pub name: String,
    pub unit: String,
    #[serde(skip)]
    pub thresholds: AlarmThresholds,
}

/// The full table payload.
#[derive(Debug, Clone, Serialize)]
pub struct LogsTable {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Value>,
    pub situation: Situation,
    pub metrics: Vec<TableMetric>,
    pub pagination: Option<PageInfo>,
}

pub fn metric_field(metric_id: DbId) -> String {
    format!("metrica_{metric_id}")
}

/// Timestamp column followed by one numeric column per metric.
pub fn build_columns(metrics: &[TableMetric]) -> Vec<TableColumn> {
    let mut columns = Vec::with_capacity(metrics.len() + 1);
    columns.push(TableColumn::new(
        "timestamp".into(),
        "Timestamp".into(),
        "dateTime",
    ));
    columns.extend(metrics.iter().map(|metric| {
        TableColumn::new(
            metric_field(metric.id_metrica),
            format!("{} ({})", metric.name, metric.unit),
            "number",
        )
    }));
    columns
}

/// Flatten one group into a row.
///
/// Readings whose metric is no longer bound still get a value column but no
/// alarm annotation.
pub fn build_row(
    group_id: DbId,
    timestamp: Timestamp,
    readings: &[StoredReading],
    metrics: &[TableMetric],
) -> Value {
    let mut row = Map::new();
    row.insert("id".into(), Value::from(group_id));
    row.insert("timestamp".into(), Value::from(timestamp.to_rfc3339()));

    for reading in readings {
        let field = metric_field(reading.id_metrica);
        let value = reading.valor_convertido.unwrap_or(reading.valor);
        row.insert(field.clone(), Value::from(value));

        if let Some(metric) = metrics.iter().find(|m| m.id_metrica == reading.id_metrica) {
            if reading.valor_convertido.is_some() {
                let kind = alarm::classify(value, &metric.thresholds);
                row.insert(
                    format!("{field}_alarm"),
                    kind.map_or(Value::Null, |k| Value::from(k.as_str())),
                );
            }
        }
    }

    Value::Object(row)
}
