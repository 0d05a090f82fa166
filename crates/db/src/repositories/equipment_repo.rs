//! Repository for the `equipment` table.

use equiplog_core::types::DbId;
use sqlx::PgPool;

use crate::models::equipment::{AlarmContacts, CreateEquipment, Equipment};

/// Column list for `equipment` queries.
const COLUMNS: &str = "id, client_id, tenant_id, name, api_key_hash, created_at";

/// Provides lookups on equipment.
pub struct EquipmentRepo;

impl EquipmentRepo {
    pub async fn create(pool: &PgPool, input: &CreateEquipment) -> Result<Equipment, sqlx::Error> {
        let query = format!(
            "INSERT INTO equipment (client_id, tenant_id, name, api_key_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(input.client_id)
            .bind(input.tenant_id)
            .bind(&input.name)
            .bind(&input.api_key_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment WHERE id = $1");
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve the equipment a device key belongs to.
    pub async fn find_by_api_key_hash(
        pool: &PgPool,
        api_key_hash: &str,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment WHERE api_key_hash = $1");
        sqlx::query_as::<_, Equipment>(&query)
            .bind(api_key_hash)
            .fetch_optional(pool)
            .await
    }

    /// Tenant owning the equipment. `None` when the equipment is unknown or
    /// has no tenant.
    pub async fn find_tenant_id(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        let tenant: Option<Option<DbId>> =
            sqlx::query_scalar("SELECT tenant_id FROM equipment WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(tenant.flatten())
    }

    /// Equipment name plus the client's responsible and administrator users.
    pub async fn find_alarm_contacts(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AlarmContacts>, sqlx::Error> {
        sqlx::query_as::<_, AlarmContacts>(
            "SELECT e.id AS equipment_id, e.name AS equipment_name, \
                    c.responsible_user_id, c.administrator_user_id \
             FROM equipment e \
             JOIN clients c ON c.id = e.client_id \
             WHERE e.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
