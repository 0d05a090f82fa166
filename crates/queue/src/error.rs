/// Errors raised by the queue client.
///
/// Publishing never surfaces these to callers; it reports `false` instead.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Broker error: {0}")]
    Broker(#[from] lapin::Error),

    #[error("Not connected to the broker")]
    NotConnected,

    #[error("Broker did not respond within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
