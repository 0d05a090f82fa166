//! Repository for the `equipment_log_groups` table.

use equiplog_core::pagination::Pagination;
use equiplog_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::log_group::{LogGroup, UpdateLogGroup};

/// Column list for `equipment_log_groups` queries.
const COLUMNS: &str = "id, equipment_id, tenant_id, timestamp, logs, created_at";

/// Provides persistence for log groups.
pub struct LogGroupRepo;

impl LogGroupRepo {
    /// Insert an empty group. Runs on the caller's connection so it can be
    /// part of the ingestion transaction.
    pub async fn create_group(
        conn: &mut PgConnection,
        equipment_id: DbId,
        tenant_id: Option<DbId>,
        timestamp: Timestamp,
    ) -> Result<LogGroup, sqlx::Error> {
        let query = format!(
            "INSERT INTO equipment_log_groups (equipment_id, tenant_id, timestamp) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LogGroup>(&query)
            .bind(equipment_id)
            .bind(tenant_id)
            .bind(timestamp)
            .fetch_one(conn)
            .await
    }

    /// Fill in the converted readings of a group.
    pub async fn update_group(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateLogGroup,
    ) -> Result<LogGroup, sqlx::Error> {
        let query = format!(
            "UPDATE equipment_log_groups SET logs = $2 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LogGroup>(&query)
            .bind(id)
            .bind(Json(&input.logs))
            .fetch_one(conn)
            .await
    }

    /// Find a group by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LogGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment_log_groups WHERE id = $1");
        sqlx::query_as::<_, LogGroup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of an equipment's groups, newest first, plus the total count.
    pub async fn find_grouped_by_timestamp(
        pool: &PgPool,
        equipment_id: DbId,
        pagination: Pagination,
    ) -> Result<(Vec<LogGroup>, i64), sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM equipment_log_groups \
             WHERE equipment_id = $1 \
             ORDER BY timestamp DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        let groups = sqlx::query_as::<_, LogGroup>(&query)
            .bind(equipment_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(pool)
            .await?;

        let total = Self::count_for_equipment(pool, equipment_id).await?;
        Ok((groups, total))
    }

    /// All groups within `[start, end]`, oldest first. Unpaginated; callers
    /// bound the range.
    pub async fn find_by_date_range(
        pool: &PgPool,
        equipment_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<LogGroup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM equipment_log_groups \
             WHERE equipment_id = $1 AND timestamp BETWEEN $2 AND $3 \
             ORDER BY timestamp ASC, id ASC"
        );
        sqlx::query_as::<_, LogGroup>(&query)
            .bind(equipment_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// The `limit` most recent groups, newest first.
    pub async fn find_recent(
        pool: &PgPool,
        equipment_id: DbId,
        limit: i64,
    ) -> Result<Vec<LogGroup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM equipment_log_groups \
             WHERE equipment_id = $1 \
             ORDER BY timestamp DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, LogGroup>(&query)
            .bind(equipment_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_equipment(pool: &PgPool, equipment_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM equipment_log_groups WHERE equipment_id = $1")
            .bind(equipment_id)
            .fetch_one(pool)
            .await
    }
}
