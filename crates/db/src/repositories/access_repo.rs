//! Equipment access capability check.

use equiplog_core::roles::ROLE_ADMIN;
use equiplog_core::types::DbId;
use sqlx::PgPool;

/// Answers whether a user may read a given equipment.
pub struct AccessRepo;

impl AccessRepo {
    /// Admins may access any existing equipment. Other users need to be the
    /// responsible, the administrator or a manager of the equipment's client.
    pub async fn user_can_access_equipment(
        pool: &PgPool,
        user_id: DbId,
        role: &str,
        equipment_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM equipment e \
                JOIN clients c ON c.id = e.client_id \
                WHERE e.id = $1 AND ( \
                    $3 = $4 \
                    OR c.responsible_user_id = $2 \
                    OR c.administrator_user_id = $2 \
                    OR EXISTS ( \
                        SELECT 1 FROM client_managers cm \
                        WHERE cm.client_id = c.id AND cm.user_id = $2 \
                    ) \
                ) \
             )",
        )
        .bind(equipment_id)
        .bind(user_id)
        .bind(role)
        .bind(ROLE_ADMIN)
        .fetch_one(pool)
        .await
    }
}
