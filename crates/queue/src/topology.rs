//! Exchange and queue layout per message class.
//!
//! ```text
//!            +--> <queue>        (TTL, DLX -> exchange/<dlq>)
//! exchange --+--> <queue>_retry  (short TTL, DLX -> exchange/<queue>)
//!            +--> <queue>_dlq
//! ```
//!
//! Every queue is bound to the direct exchange with its own name as
//! routing key. Messages expiring in the retry queue flow back to the main
//! queue; messages rejected or expiring in the main queue go to the DLQ.

use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};

/// Names and limits for one message class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTopology {
    pub exchange: &'static str,
    pub queue: &'static str,
    pub retry_queue: &'static str,
    pub dead_letter_queue: &'static str,
    /// TTL of messages waiting in the main queue.
    pub message_ttl_ms: i32,
    /// Delay before a retried message returns to the main queue.
    pub retry_ttl_ms: i32,
    /// Failed deliveries at or above this count are dead-lettered.
    pub max_retries: u32,
    /// Unacknowledged deliveries per consumer.
    pub prefetch: u16,
}

/// Equipment log batches.
pub const LOGS: QueueTopology = QueueTopology {
    exchange: "equipamento_logs_exchange",
    queue: "equipamento_logs",
    retry_queue: "equipamento_logs_retry",
    dead_letter_queue: "equipamento_logs_dlq",
    message_ttl_ms: 300_000,
    retry_ttl_ms: 60_000,
    max_retries: 5,
    prefetch: 10,
};

/// Report generation requests.
pub const REPORTS: QueueTopology = QueueTopology {
    exchange: "report_requests_exchange",
    queue: "report_requests",
    retry_queue: "report_requests_retry",
    dead_letter_queue: "report_requests_dlq",
    message_ttl_ms: 3_600_000,
    retry_ttl_ms: 300_000,
    max_retries: 3,
    prefetch: 5,
};

/// Every class declared on connect.
pub const ALL: [QueueTopology; 2] = [LOGS, REPORTS];

fn dead_letter_args(exchange: &str, routing_key: &str, ttl_ms: i32) -> FieldTable {
    let mut args = FieldTable::default();
    args.insert(
        ShortString::from("x-dead-letter-exchange"),
        AMQPValue::LongString(LongString::from(exchange)),
    );
    args.insert(
        ShortString::from("x-dead-letter-routing-key"),
        AMQPValue::LongString(LongString::from(routing_key)),
    );
    args.insert(ShortString::from("x-message-ttl"), AMQPValue::LongInt(ttl_ms));
    args
}

impl QueueTopology {
    /// Main queue: expired or rejected messages go to the DLQ.
    pub fn main_queue_args(&self) -> FieldTable {
        dead_letter_args(self.exchange, self.dead_letter_queue, self.message_ttl_ms)
    }

    /// Retry queue: expired messages go back to the main queue.
    pub fn retry_queue_args(&self) -> FieldTable {
        dead_letter_args(self.exchange, self.queue, self.retry_ttl_ms)
    }

    /// `(queue, arguments)` for each of the three queues.
    pub fn queues(&self) -> [(&'static str, FieldTable); 3] {
        [
            (self.queue, self.main_queue_args()),
            (self.retry_queue, self.retry_queue_args()),
            (self.dead_letter_queue, FieldTable::default()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg<'a>(table: &'a FieldTable, key: &str) -> Option<&'a AMQPValue> {
        table
            .inner()
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    #[test]
    fn main_queue_dead_letters_to_dlq() {
        let args = LOGS.main_queue_args();
        assert_eq!(
            arg(&args, "x-dead-letter-exchange"),
            Some(&AMQPValue::LongString("equipamento_logs_exchange".into()))
        );
        assert_eq!(
            arg(&args, "x-dead-letter-routing-key"),
            Some(&AMQPValue::LongString("equipamento_logs_dlq".into()))
        );
        assert_eq!(arg(&args, "x-message-ttl"), Some(&AMQPValue::LongInt(300_000)));
    }

    #[test]
    fn retry_queue_returns_to_main_queue() {
        let args = REPORTS.retry_queue_args();
        assert_eq!(
            arg(&args, "x-dead-letter-routing-key"),
            Some(&AMQPValue::LongString("report_requests".into()))
        );
        assert_eq!(arg(&args, "x-message-ttl"), Some(&AMQPValue::LongInt(300_000)));
    }

    #[test]
    fn dead_letter_queue_has_no_arguments() {
        let queues = LOGS.queues();
        assert_eq!(queues[2].0, "equipamento_logs_dlq");
        assert!(queues[2].1.inner().is_empty());
    }

    #[test]
    fn retry_is_shorter_than_main_ttl() {
        for topology in ALL {
            assert!(topology.retry_ttl_ms < topology.message_ttl_ms);
        }
    }
}
