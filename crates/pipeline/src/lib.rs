//! Ingestion and read-path services shared by the API and the worker.
//!
//! - [`IngestionService`]: converts a batch, persists it as one log group
//!   and publishes alarm events.
//! - [`LogTableService`]: shapes stored groups into the data-grid table.
//! - [`ReportService`]: loads and summarizes the data behind a report
//!   request.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod report;
pub mod table;

pub use config::IngestionConfig;
pub use error::PipelineError;
pub use ingestion::{IngestedBatch, IngestionService};
pub use report::{ReportService, ReportSummary};
pub use table::LogTableService;
