//! Data collection for queued report requests.

use equiplog_core::report::{validate_range, ReportFormat, ReportRequest};
use equiplog_core::situation::Situation;
use equiplog_core::types::DbId;
use equiplog_db::repositories::{LogGroupRepo, MetricBindingRepo};
use equiplog_db::DbPool;
use serde::Serialize;

use crate::error::PipelineError;
use crate::table::LogTableService;

/// What a report over the requested range would contain.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub equipment_id: DbId,
    pub format: ReportFormat,
    pub range_days: i64,
    pub groups: usize,
    pub readings: usize,
    pub metrics: usize,
    pub situation: Situation,
}

pub struct ReportService;

impl ReportService {
    /// Validate the request again and load the range it covers.
    pub async fn collect(
        pool: &DbPool,
        request: &ReportRequest,
    ) -> Result<ReportSummary, PipelineError> {
        let range_days = validate_range(request.start_date, request.end_date)?;
        let equipment_id = request.id_equipamento;

        let groups = LogGroupRepo::find_by_date_range(
            pool,
            equipment_id,
            request.start_date,
            request.end_date,
        )
        .await?;
        let bindings = MetricBindingRepo::list_for_equipment(pool, equipment_id).await?;

        let mut readings = 0;
        for group in &groups {
            readings += group.readings()?.len();
        }

        Ok(ReportSummary {
            equipment_id,
            format: request.format,
            range_days,
            groups: groups.len(),
            readings,
            metrics: bindings.len(),
            situation: LogTableService::situation(pool, equipment_id).await?,
        })
    }
}
