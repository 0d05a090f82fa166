//! Equipment log ingestion domain logic.
//!
//! Everything in this crate is pure: no database, broker or HTTP access.
//! The `db`, `pipeline` and `api` crates fetch data and pass it in.

pub mod alarm;
pub mod batch;
pub mod conversion;
pub mod device_keys;
pub mod error;
pub mod pagination;
pub mod report;
pub mod roles;
pub mod situation;
pub mod table;
pub mod time;
pub mod types;
