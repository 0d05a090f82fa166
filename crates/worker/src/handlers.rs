//! Message handlers for the log and report queues.
//!
//! A returned error sends the message down the retry/dead-letter path, so
//! handlers fail loudly on anything they cannot process.

use async_trait::async_trait;
use equiplog_core::batch::{validate_batch, LogBatch};
use equiplog_core::report::ReportRequest;
use equiplog_db::repositories::EquipmentRepo;
use equiplog_db::DbPool;
use equiplog_pipeline::{IngestionService, ReportService};
use equiplog_queue::{HandlerError, MessageHandler};

/// Ingests queued log batches.
pub struct LogBatchHandler {
    pool: DbPool,
    ingestion: IngestionService,
}

impl LogBatchHandler {
    pub fn new(pool: DbPool, ingestion: IngestionService) -> Self {
        Self { pool, ingestion }
    }
}

#[async_trait]
impl MessageHandler for LogBatchHandler {
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let batch: LogBatch = serde_json::from_slice(payload)?;
        validate_batch(&batch)?;

        let Some(equipment_id) = batch.equipment_id() else {
            tracing::warn!("Queued batch has no equipment id, dropping");
            return Ok(());
        };

        let tenant_id = EquipmentRepo::find_tenant_id(&self.pool, equipment_id).await?;
        if let Some(ingested) = self.ingestion.ingest(&batch, tenant_id).await? {
            tracing::debug!(
                equipment_id,
                group_id = ingested.group.id,
                alarms = ingested.alarms.len(),
                "Queued batch processed"
            );
        }
        Ok(())
    }
}

/// Collects the data behind queued report requests.
///
/// Rendering and emailing the file belong to the reporting service; this
/// handler validates the request and loads the range it covers.
pub struct ReportRequestHandler {
    pool: DbPool,
}

impl ReportRequestHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageHandler for ReportRequestHandler {
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let request: ReportRequest = serde_json::from_slice(payload)?;
        let summary = ReportService::collect(&self.pool, &request).await?;

        tracing::info!(
            equipment_id = summary.equipment_id,
            user_id = request.user_id,
            format = ?summary.format,
            range_days = summary.range_days,
            groups = summary.groups,
            readings = summary.readings,
            situation = ?summary.situation,
            "Report data collected"
        );
        Ok(())
    }
}
