//! Report requests. Generation happens in the worker; this only validates
//! and queues.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use equiplog_core::error::CoreError;
use equiplog_core::report::{estimated_minutes, validate_range, ReportFormat, ReportRequest};
use equiplog_core::types::{DbId, Timestamp};
use equiplog_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use super::ensure_equipment_access;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportBody {
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub format: String,
    /// Defaults to the requesting user's email.
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAccepted {
    pub message: &'static str,
    /// Minutes.
    pub estimated_time: i64,
}

/// POST /api/v1/equipamentos/{id}/reports
pub async fn request_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(equipment_id): Path<DbId>,
    payload: Result<Json<CreateReportBody>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ReportAccepted>)> {
    let Json(body) = payload?;
    let format: ReportFormat = body.format.parse()?;
    let days = validate_range(body.start_date, body.end_date)?;
    ensure_equipment_access(&state, &auth, equipment_id).await?;

    let email = match body.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => email,
        None => {
            UserRepo::find_by_id(&state.pool, auth.user_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "User",
                    id: auth.user_id,
                })?
                .email
        }
    };

    let request = ReportRequest {
        id_equipamento: equipment_id,
        user_id: auth.user_id,
        start_date: body.start_date,
        end_date: body.end_date,
        format,
        email: Some(email),
    };

    let connected = state.queue.is_connected().await || state.queue.reconnect().await;
    if !connected || !state.queue.publish_report_request(&request).await {
        tracing::warn!(equipment_id, "Report request could not be queued");
        return Err(AppError::ServiceUnavailable(
            "Report queue is busy, try again shortly".into(),
        ));
    }

    tracing::info!(equipment_id, user_id = auth.user_id, days, "Report request queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(ReportAccepted {
            message: "Report is being generated and will be emailed when ready",
            estimated_time: estimated_minutes(days),
        }),
    ))
}
