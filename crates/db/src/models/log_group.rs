//! Equipment log group model.

use equiplog_core::batch::StoredReading;
use equiplog_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `equipment_log_groups` table.
///
/// `logs` is the JSONB array of [`StoredReading`]s written by ingestion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LogGroup {
    pub id: DbId,
    pub equipment_id: DbId,
    pub tenant_id: Option<DbId>,
    pub timestamp: Timestamp,
    pub logs: serde_json::Value,
    pub created_at: Timestamp,
}

impl LogGroup {
    /// Decode the stored readings.
    pub fn readings(&self) -> Result<Vec<StoredReading>, serde_json::Error> {
        serde_json::from_value(self.logs.clone())
    }
}

/// The only mutable part of a group after creation.
///
/// Identity, equipment and timestamp are fixed at creation.
#[derive(Debug, Clone)]
pub struct UpdateLogGroup {
    pub logs: Vec<StoredReading>,
}
