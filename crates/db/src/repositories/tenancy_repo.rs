//! Repositories for tenants, users and clients.
//!
//! Only the writes needed to seed reference data are exposed here.

use equiplog_core::types::DbId;
use sqlx::PgPool;

use crate::models::tenancy::{Client, CreateClient, CreateUser, Tenant, User};

const USER_COLUMNS: &str = "id, tenant_id, name, email, role, created_at";

const CLIENT_COLUMNS: &str =
    "id, tenant_id, name, responsible_user_id, administrator_user_id, created_at";

pub struct TenantRepo;

impl TenantRepo {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Tenant, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }
}

pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (tenant_id, name, email, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.tenant_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

pub struct ClientRepo;

impl ClientRepo {
    pub async fn create(pool: &PgPool, input: &CreateClient) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (tenant_id, name, responsible_user_id, administrator_user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {CLIENT_COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(input.tenant_id)
            .bind(&input.name)
            .bind(input.responsible_user_id)
            .bind(input.administrator_user_id)
            .fetch_one(pool)
            .await
    }

    /// Link a manager to a client. Linking twice is a no-op.
    pub async fn add_manager(
        pool: &PgPool,
        client_id: DbId,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO client_managers (client_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(client_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
