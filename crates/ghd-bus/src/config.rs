use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delivery policy of the in-memory bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Delay before an ignored message becomes visible again.
    #[serde(default = "default_redelivery_delay_ms")]
    pub redelivery_delay_ms: u64,
    /// Deliveries after which an unacknowledged message is dead-lettered
    /// (`None` redelivers forever).
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: Option<u32>,
    /// Upper bound on a single blocking wait inside `receive`.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_redelivery_delay_ms() -> u64 {
    10
}

fn default_max_delivery_attempts() -> Option<u32> {
    Some(16)
}

fn default_poll_interval_ms() -> u64 {
    25
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            redelivery_delay_ms: default_redelivery_delay_ms(),
            max_delivery_attempts: default_max_delivery_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl BusConfig {
    pub(crate) fn redelivery_delay(&self) -> Duration {
        Duration::from_millis(self.redelivery_delay_ms)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
