//! Retry accounting for failed deliveries.

use lapin::types::{AMQPValue, FieldTable, ShortString};

/// Header counting how many times a message has been retried.
pub const RETRY_COUNT_HEADER: &str = "x-retry-count";

/// What to do with a delivery once its handler has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Handler succeeded.
    Ack,
    /// Republish to the retry queue carrying `attempt`, then ack.
    Retry { attempt: u32 },
    /// Reject without requeue so the broker routes it to the DLQ.
    DeadLetter,
}

/// Decide the settlement for a delivery.
pub fn settle(succeeded: bool, retry_count: u32, max_retries: u32) -> Settlement {
    if succeeded {
        Settlement::Ack
    } else if retry_count < max_retries {
        Settlement::Retry {
            attempt: retry_count + 1,
        }
    } else {
        Settlement::DeadLetter
    }
}

fn as_count(value: &AMQPValue) -> Option<u32> {
    let n: i64 = match value {
        AMQPValue::ShortShortInt(v) => (*v).into(),
        AMQPValue::ShortShortUInt(v) => (*v).into(),
        AMQPValue::ShortInt(v) => (*v).into(),
        AMQPValue::ShortUInt(v) => (*v).into(),
        AMQPValue::LongInt(v) => (*v).into(),
        AMQPValue::LongUInt(v) => (*v).into(),
        AMQPValue::LongLongInt(v) => *v,
        _ => return None,
    };
    u32::try_from(n).ok()
}

/// Read the retry count from message headers. Missing or unreadable is 0.
pub fn retry_count(headers: Option<&FieldTable>) -> u32 {
    headers
        .and_then(|table| {
            table
                .inner()
                .iter()
                .find(|(key, _)| key.as_str() == RETRY_COUNT_HEADER)
                .and_then(|(_, value)| as_count(value))
        })
        .unwrap_or(0)
}

/// Headers for a republished message.
pub fn retry_headers(attempt: u32) -> FieldTable {
    let mut headers = FieldTable::default();
    headers.insert(
        ShortString::from(RETRY_COUNT_HEADER),
        AMQPValue::LongLongInt(attempt.into()),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_acked_regardless_of_count() {
        assert_eq!(settle(true, 99, 5), Settlement::Ack);
    }

    #[test]
    fn failures_below_ceiling_are_retried_with_incremented_count() {
        assert_eq!(settle(false, 0, 5), Settlement::Retry { attempt: 1 });
        assert_eq!(settle(false, 4, 5), Settlement::Retry { attempt: 5 });
    }

    #[test]
    fn failures_at_ceiling_are_dead_lettered() {
        assert_eq!(settle(false, 5, 5), Settlement::DeadLetter);
        assert_eq!(settle(false, 3, 3), Settlement::DeadLetter);
    }

    #[test]
    fn missing_header_counts_as_zero() {
        assert_eq!(retry_count(None), 0);
        assert_eq!(retry_count(Some(&FieldTable::default())), 0);
    }

    #[test]
    fn header_round_trips() {
        let headers = retry_headers(3);
        assert_eq!(retry_count(Some(&headers)), 3);
    }

    #[test]
    fn integer_variants_are_accepted() {
        let mut headers = FieldTable::default();
        headers.insert(RETRY_COUNT_HEADER.into(), AMQPValue::LongInt(2));
        assert_eq!(retry_count(Some(&headers)), 2);

        let mut negative = FieldTable::default();
        negative.insert(RETRY_COUNT_HEADER.into(), AMQPValue::LongInt(-1));
        assert_eq!(retry_count(Some(&negative)), 0);
    }

    #[test]
    fn a_message_is_retried_exactly_max_times_before_dlq() {
        let max = 5;
        let mut count = 0;
        let mut retries = 0;
        loop {
            match settle(false, count, max) {
                Settlement::Retry { attempt } => {
                    retries += 1;
                    count = attempt;
                }
                Settlement::DeadLetter => break,
                Settlement::Ack => unreachable!(),
            }
        }
        assert_eq!(retries, max);
    }
}
