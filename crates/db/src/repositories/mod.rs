//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or `&mut PgConnection` inside a caller's transaction)
//! as the first argument.

pub mod access_repo;
pub mod equipment_repo;
pub mod log_group_repo;
pub mod metric_binding_repo;
pub mod notification_repo;
pub mod tenancy_repo;

pub use access_repo::AccessRepo;
pub use equipment_repo::EquipmentRepo;
pub use log_group_repo::LogGroupRepo;
pub use metric_binding_repo::{MetricBindingRepo, MetricRepo};
pub use notification_repo::NotificationRepo;
pub use tenancy_repo::{ClientRepo, TenantRepo, UserRepo};
