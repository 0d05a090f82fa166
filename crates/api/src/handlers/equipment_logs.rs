//! Device log intake.
//!
//! Batches go to the broker when it is reachable and are ingested inline
//! otherwise, so an accepted batch is never dropped by a broker outage.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use equiplog_core::batch::{bind_to_equipment, validate_batch, LogBatch};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::device::DeviceAuth;
use crate::state::AppState;

/// POST /api/v1/equipamento-logs/receive
///
/// 202 when queued, 201 with the stored group when ingested inline.
pub async fn receive_logs(
    device: DeviceAuth,
    State(state): State<AppState>,
    payload: Result<Json<LogBatch>, JsonRejection>,
) -> AppResult<Response> {
    let Json(mut batch) = payload?;
    validate_batch(&batch)?;
    bind_to_equipment(&mut batch, device.equipment_id)?;

    let equipment_id = device.equipment_id;
    let connected = state.queue.is_connected().await || state.queue.reconnect().await;

    if connected {
        if state.queue.publish_batch(&batch).await {
            tracing::debug!(equipment_id, readings = batch.logs.len(), "Log batch queued");
            return Ok((
                StatusCode::ACCEPTED,
                Json(json!({ "accepted": true, "processingMode": "async" })),
            )
                .into_response());
        }
        tracing::warn!(equipment_id, "Broker rejected log batch, ingesting inline");
    } else {
        tracing::warn!(equipment_id, "Broker unavailable, ingesting inline");
    }

    let ingested = state
        .ingestion
        .ingest(&batch, device.tenant_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Bound batch has no equipment id".into()))?;

    let mut body = serde_json::to_value(&ingested)
        .map_err(|e| AppError::InternalError(format!("Failed to encode log group: {e}")))?;
    body["processingMode"] = json!("sync");

    Ok((StatusCode::CREATED, Json(body)).into_response())
}
