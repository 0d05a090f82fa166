pub mod equipment;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /equipamento-logs/receive                 device log intake (X-API-Key)
///
/// /equipamentos/{id}/logs/table             logs table (JWT)
/// /equipamentos/{id}/reports                queue a report (JWT)
///
/// /notifications                            list (JWT)
/// /notifications/unread-count               unread count
/// /notifications/read-all                   mark all read
/// /notifications/{id}/read                  mark one read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/equipamento-logs", equipment::device_router())
        .nest("/equipamentos", equipment::router())
        .nest("/notifications", notification::router())
}
