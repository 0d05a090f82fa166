pub mod equipment_logs;
pub mod logs_table;
pub mod notification;
pub mod reports;

use equiplog_core::error::CoreError;
use equiplog_core::types::DbId;
use equiplog_db::repositories::{AccessRepo, EquipmentRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// 404 for unknown equipment, 403 when the user has no link to it.
pub(crate) async fn ensure_equipment_access(
    state: &AppState,
    auth: &AuthUser,
    equipment_id: DbId,
) -> AppResult<()> {
    if EquipmentRepo::find_by_id(&state.pool, equipment_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Equipment",
            id: equipment_id,
        }));
    }

    let allowed =
        AccessRepo::user_can_access_equipment(&state.pool, auth.user_id, &auth.role, equipment_id)
            .await?;
    if !allowed {
        return Err(AppError::Core(CoreError::Forbidden(
            "No access to this equipment".into(),
        )));
    }
    Ok(())
}
