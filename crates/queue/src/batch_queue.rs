//! The queue operations the HTTP layer depends on.

use async_trait::async_trait;
use equiplog_core::batch::LogBatch;
use equiplog_core::report::ReportRequest;

use crate::client::QueueClient;
use crate::topology::{LOGS, REPORTS};

/// Publishing side of the broker as seen by request handlers.
///
/// All methods are infallible; `false` means "not queued" and the caller
/// picks a fallback.
#[async_trait]
pub trait BatchQueue: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Try to re-establish the connection. Returns whether it is usable.
    ///
    /// Must return within a bounded time even when the broker is silent.
    async fn reconnect(&self) -> bool;

    async fn publish_batch(&self, batch: &LogBatch) -> bool;

    async fn publish_report_request(&self, request: &ReportRequest) -> bool;
}

#[async_trait]
impl BatchQueue for QueueClient {
    async fn is_connected(&self) -> bool {
        QueueClient::is_connected(self).await
    }

    async fn reconnect(&self) -> bool {
        QueueClient::reconnect(self).await
    }

    async fn publish_batch(&self, batch: &LogBatch) -> bool {
        self.publish(&LOGS, batch).await
    }

    async fn publish_report_request(&self, request: &ReportRequest) -> bool {
        self.publish(&REPORTS, request).await
    }
}
