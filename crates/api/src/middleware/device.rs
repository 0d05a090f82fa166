//! Device authentication by API key.
//!
//! Equipment sends its plaintext key in `X-API-Key`; the key is hashed and
//! looked up against `equipment.api_key_hash`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use equiplog_core::device_keys::{hash_device_key, DEVICE_KEY_HEADER};
use equiplog_core::error::CoreError;
use equiplog_core::types::DbId;
use equiplog_db::repositories::EquipmentRepo;

use crate::error::AppError;
use crate::state::AppState;

/// The equipment a request was authenticated as.
#[derive(Debug, Clone)]
pub struct DeviceAuth {
    pub equipment_id: DbId,
    pub tenant_id: Option<DbId>,
}

impl FromRequestParts<AppState> for DeviceAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(DEVICE_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing X-API-Key header".into()))
            })?;

        let equipment = EquipmentRepo::find_by_api_key_hash(&state.pool, &hash_device_key(key))
            .await?
            .ok_or_else(|| {
                tracing::warn!("Rejected device request with unknown API key");
                AppError::Core(CoreError::Unauthorized("Invalid API key".into()))
            })?;

        Ok(DeviceAuth {
            equipment_id: equipment.id,
            tenant_id: equipment.tenant_id,
        })
    }
}
