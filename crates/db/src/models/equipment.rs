//! Equipment entity model and DTOs.

use equiplog_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `equipment` table.
///
/// The key hash is never serialized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Equipment {
    pub id: DbId,
    pub client_id: DbId,
    pub tenant_id: Option<DbId>,
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key_hash: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for registering equipment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEquipment {
    pub client_id: DbId,
    pub tenant_id: Option<DbId>,
    pub name: String,
    pub api_key_hash: Option<String>,
}

/// Who should hear about alarms on a piece of equipment.
#[derive(Debug, Clone, FromRow)]
pub struct AlarmContacts {
    pub equipment_id: DbId,
    pub equipment_name: String,
    pub responsible_user_id: Option<DbId>,
    pub administrator_user_id: Option<DbId>,
}

impl AlarmContacts {
    /// Distinct recipient ids: responsible first, then administrator.
    pub fn recipients(&self) -> Vec<DbId> {
        let mut ids = Vec::with_capacity(2);
        for id in [self.responsible_user_id, self.administrator_user_id]
            .into_iter()
            .flatten()
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
