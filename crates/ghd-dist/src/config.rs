use std::fs;
use std::path::Path;
use std::time::Duration;

use ghd_core::errors::{ErrorInfo, SearchError};
use serde::{Deserialize, Serialize};

/// YAML-configurable dispatch parameters shared by coordinators and workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Topic tasks are published on.
    #[serde(default = "default_work_topic")]
    pub work_topic: String,
    /// Topic results are published on.
    #[serde(default = "default_answer_topic")]
    pub answer_topic: String,
    /// How long a coordinator waits for its reply; `None` waits forever.
    #[serde(default = "default_result_timeout_ms")]
    pub result_timeout_ms: Option<u64>,
    /// Dispatches per round before a timeout becomes fatal.
    #[serde(default = "default_max_dispatch_attempts")]
    pub max_dispatch_attempts: u32,
    /// Backoff applied to failed publishes.
    #[serde(default)]
    pub publish_retry: RetryPolicy,
}

fn default_work_topic() -> String {
    "workTopic".to_owned()
}

fn default_answer_topic() -> String {
    "answerTopic".to_owned()
}

fn default_result_timeout_ms() -> Option<u64> {
    Some(60_000)
}

fn default_max_dispatch_attempts() -> u32 {
    3
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            work_topic: default_work_topic(),
            answer_topic: default_answer_topic(),
            result_timeout_ms: default_result_timeout_ms(),
            max_dispatch_attempts: default_max_dispatch_attempts(),
            publish_retry: RetryPolicy::default(),
        }
    }
}

impl DispatchConfig {
    /// Reads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            SearchError::Config(
                ErrorInfo::new("read-config", format!("failed to read config: {err}"))
                    .with_context("path", path.display()),
            )
        })?;
        serde_yaml::from_str(&contents).map_err(|err| {
            SearchError::Config(
                ErrorInfo::new("parse-config", err.to_string()).with_context("path", path.display()),
            )
        })
    }

    /// Reply timeout as a duration.
    pub fn result_timeout(&self) -> Option<Duration> {
        self.result_timeout_ms.map(Duration::from_millis)
    }
}

/// Exponential backoff for retryable publish failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failure.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap on the doubled delay.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    20
}

fn default_max_backoff_ms() -> u64 {
    1_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.min(32)).unwrap_or(u64::MAX);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}
