use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{equipment_logs, logs_table, reports};
use crate::state::AppState;

/// Routes mounted at `/equipamento-logs`, authenticated by device key.
pub fn device_router() -> Router<AppState> {
    Router::new().route("/receive", post(equipment_logs::receive_logs))
}

/// Routes mounted at `/equipamentos`.
///
/// ```text
/// GET    /{id}/logs/table    -> get_logs_table
/// POST   /{id}/reports       -> request_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/logs/table", get(logs_table::get_logs_table))
        .route("/{id}/reports", post(reports::request_report))
}
