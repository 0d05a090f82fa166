//! Queue consumers for the equipment log worker.

pub mod handlers;

pub use handlers::{LogBatchHandler, ReportRequestHandler};
