//! Tenants, users and clients.

use equiplog_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tenants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub tenant_id: Option<DbId>,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: Timestamp,
}

/// DTO for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub tenant_id: Option<DbId>,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// A row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub tenant_id: Option<DbId>,
    pub name: String,
    pub responsible_user_id: Option<DbId>,
    pub administrator_user_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for creating a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClient {
    pub tenant_id: Option<DbId>,
    pub name: String,
    pub responsible_user_id: Option<DbId>,
    pub administrator_user_id: Option<DbId>,
}
