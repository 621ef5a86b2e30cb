use std::thread;

use ghd_bus::{Bus, MessageId};
use ghd_core::SearchError;
use tracing::warn;

use crate::config::RetryPolicy;

/// Publishes `data`, retrying retryable failures with exponential backoff.
///
/// Non-retryable errors and the last retryable one are returned unchanged
/// apart from an `attempts` context entry.
pub fn publish_with_retry<B: Bus + ?Sized>(
    bus: &B,
    topic: &str,
    data: &[u8],
    policy: &RetryPolicy,
) -> Result<MessageId, SearchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match bus.publish(topic, data.to_vec()) {
            Ok(id) => return Ok(id),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff(attempt - 1);
                warn!(
                    topic,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "publish failed, backing off"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err.with_context("attempts", attempt)),
        }
    }
}
