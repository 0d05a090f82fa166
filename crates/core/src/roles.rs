//! User role names stored in `users.role`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_RESPONSIBLE: &str = "responsible";
pub const ROLE_USER: &str = "user";
