use std::sync::Arc;

use equiplog_pipeline::IngestionService;
use equiplog_queue::BatchQueue;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: equiplog_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Broker seam; tests substitute fakes.
    pub queue: Arc<dyn BatchQueue>,
    /// Inline ingestion used when a batch cannot be queued.
    pub ingestion: IngestionService,
}
