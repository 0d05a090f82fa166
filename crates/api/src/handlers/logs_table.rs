use axum::extract::{Path, Query, State};
use axum::Json;
use equiplog_core::pagination::Pagination;
use equiplog_core::table::LogsTable;
use equiplog_core::types::{DbId, Timestamp};
use equiplog_pipeline::LogTableService;
use serde::Deserialize;

use super::ensure_equipment_access;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Query parameters for the logs table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsTableQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// GET /api/v1/equipamentos/{id}/logs/table
pub async fn get_logs_table(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(equipment_id): Path<DbId>,
    Query(params): Query<LogsTableQuery>,
) -> AppResult<Json<LogsTable>> {
    ensure_equipment_access(&state, &auth, equipment_id).await?;

    let table = LogTableService::logs_table(
        &state.pool,
        equipment_id,
        Pagination::new(params.page, params.page_size),
        params.start_date,
        params.end_date,
    )
    .await?;

    Ok(Json(table))
}
