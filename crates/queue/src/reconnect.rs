//! Exponential-backoff connection retry for processes that cannot run
//! without the broker.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::QueueClient;

/// Tunable parameters for the exponential-backoff strategy.
pub struct ReconnectConfig {
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Next backoff delay, clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Keep calling [`QueueClient::connect`] until it succeeds.
///
/// Returns `false` if `cancel` fires first.
pub async fn connect_with_backoff(
    client: &QueueClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> bool {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match client.connect().await {
            Ok(()) => {
                tracing::info!(attempt, "Connected to broker");
                return true;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Broker connection failed, retrying",
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Broker reconnect cancelled");
                return false;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, config);
    }
}
