use equiplog_core::time::DEFAULT_OFFSET_HOURS;

/// Ingestion settings.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Hours added to the receipt instant to form a group's timestamp.
    pub timestamp_offset_hours: i64,
}

impl IngestionConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `LOG_TIMESTAMP_OFFSET_HOURS` | `-3`    |
    pub fn from_env() -> Self {
        let timestamp_offset_hours: i64 = std::env::var("LOG_TIMESTAMP_OFFSET_HOURS")
            .unwrap_or_else(|_| DEFAULT_OFFSET_HOURS.to_string())
            .parse()
            .expect("LOG_TIMESTAMP_OFFSET_HOURS must be a valid i64");
        Self {
            timestamp_offset_hours,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            timestamp_offset_hours: DEFAULT_OFFSET_HOURS,
        }
    }
}
