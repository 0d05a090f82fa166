//! Read path behind the equipment logs table.

use equiplog_core::error::CoreError;
use equiplog_core::pagination::Pagination;
use equiplog_core::report::validate_range;
use equiplog_core::situation::{self, Situation, FROZEN_WINDOW};
use equiplog_core::table::{build_columns, build_row, LogsTable, TableMetric};
use equiplog_core::types::{DbId, Timestamp};
use equiplog_db::models::log_group::LogGroup;
use equiplog_db::models::metric_binding::MetricBinding;
use equiplog_db::repositories::{LogGroupRepo, MetricBindingRepo};
use equiplog_db::DbPool;

use crate::error::PipelineError;

pub struct LogTableService;

impl LogTableService {
    /// Build the table for one equipment.
    ///
    /// With both dates the bounded range is returned oldest first and
    /// unpaginated; otherwise one page, newest first. Giving only one of the
    /// two dates is a validation error.
    pub async fn logs_table(
        pool: &DbPool,
        equipment_id: DbId,
        pagination: Pagination,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<LogsTable, PipelineError> {
        let bindings = MetricBindingRepo::list_for_equipment(pool, equipment_id).await?;
        let metrics = table_metrics(&bindings);

        let (groups, page_info) = match (start, end) {
            (Some(start), Some(end)) => {
                validate_range(start, end)?;
                let groups = LogGroupRepo::find_by_date_range(pool, equipment_id, start, end).await?;
                (groups, None)
            }
            (None, None) => {
                let (groups, total) =
                    LogGroupRepo::find_grouped_by_timestamp(pool, equipment_id, pagination).await?;
                (groups, Some(pagination.info(total)))
            }
            _ => {
                return Err(CoreError::Validation(
                    "startDate and endDate must be given together".into(),
                )
                .into())
            }
        };

        let situation = Self::situation(pool, equipment_id).await?;

        let rows = groups
            .iter()
            .map(|group| {
                let readings = group.readings()?;
                Ok(build_row(group.id, group.timestamp, &readings, &metrics))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        tracing::debug!(
            equipment_id,
            rows = rows.len(),
            situation = ?situation,
            "Logs table built"
        );

        Ok(LogsTable {
            columns: build_columns(&metrics),
            rows,
            situation,
            metrics,
            pagination: page_info,
        })
    }

    /// Working/frozen signal from the most recent groups.
    pub async fn situation(pool: &DbPool, equipment_id: DbId) -> Result<Situation, PipelineError> {
        let recent = LogGroupRepo::find_recent(pool, equipment_id, FROZEN_WINDOW as i64).await?;
        Ok(situation::detect(&payloads(&recent)))
    }
}

pub(crate) fn payloads(groups: &[LogGroup]) -> Vec<serde_json::Value> {
    groups.iter().map(|group| group.logs.clone()).collect()
}

pub(crate) fn table_metrics(bindings: &[MetricBinding]) -> Vec<TableMetric> {
    bindings
        .iter()
        .map(|binding| TableMetric {
            id_metrica: binding.metric_id,
            name: binding.metric_name.clone(),
            unit: binding.metric_unit.clone(),
            thresholds: binding.thresholds(),
        })
        .collect()
}
