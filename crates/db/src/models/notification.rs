//! Notification entity model.

use equiplog_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub description: String,
    pub viewed: bool,
    pub viewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
