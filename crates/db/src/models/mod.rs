//! Row types (`FromRow`) and input DTOs, one module per table family.

pub mod equipment;
pub mod log_group;
pub mod metric_binding;
pub mod notification;
pub mod tenancy;
