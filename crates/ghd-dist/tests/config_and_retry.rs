use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use ghd_bus::{Bus, Delivery, InMemoryBus, Message, MessageId, ReceiveOutcome};
use ghd_core::{ErrorInfo, SearchError};
use ghd_dist::{publish_with_retry, DispatchConfig, RetryPolicy};
use tempfile::NamedTempFile;

/// Fails the first `failures` publishes with the given error family.
struct FlakyBus {
    inner: InMemoryBus,
    failures: AtomicU32,
    fatal: bool,
    calls: AtomicU32,
}

impl FlakyBus {
    fn new(failures: u32, fatal: bool) -> Self {
        Self {
            inner: InMemoryBus::default(),
            failures: AtomicU32::new(failures),
            fatal,
            calls: AtomicU32::new(0),
        }
    }
}

impl Bus for FlakyBus {
    fn publish(&self, topic: &str, data: Vec<u8>) -> Result<MessageId, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            let info = ErrorInfo::new("broker-unavailable", "injected failure");
            return Err(if self.fatal {
                SearchError::Config(info)
            } else {
                SearchError::Transport(info)
            });
        }
        self.inner.publish(topic, data)
    }

    fn receive(
        &self,
        topic: &str,
        deadline: Option<Instant>,
        handler: &mut dyn FnMut(&Message) -> Delivery,
    ) -> Result<ReceiveOutcome, SearchError> {
        self.inner.receive(topic, deadline, handler)
    }
}

fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 1,
        max_backoff_ms: 4,
    }
}

#[test]
fn publish_recovers_from_transient_failures() {
    let bus = FlakyBus::new(2, false);
    publish_with_retry(&bus, "workTopic", b"task", &quick_policy(5)).unwrap();
    assert_eq!(bus.calls.load(Ordering::SeqCst), 3);
    assert_eq!(bus.inner.pending("workTopic"), 1);
}

#[test]
fn publish_gives_up_after_the_limit() {
    let bus = FlakyBus::new(10, false);
    let err = publish_with_retry(&bus, "workTopic", b"task", &quick_policy(3)).unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
    assert_eq!(err.info().context.get("attempts").map(String::as_str), Some("3"));
    assert_eq!(bus.calls.load(Ordering::SeqCst), 3);
    assert_eq!(bus.inner.pending("workTopic"), 0);
}

#[test]
fn non_retryable_failures_are_returned_at_once() {
    let bus = FlakyBus::new(1, true);
    let err = publish_with_retry(&bus, "workTopic", b"task", &quick_policy(5)).unwrap_err();
    assert!(matches!(err, SearchError::Config(_)));
    assert_eq!(bus.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn backoff_doubles_up_to_the_cap() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff(0), Duration::from_millis(20));
    assert_eq!(policy.backoff(1), Duration::from_millis(40));
    assert_eq!(policy.backoff(5), Duration::from_millis(640));
    assert_eq!(policy.backoff(6), Duration::from_millis(1_000));
    assert_eq!(policy.backoff(60), Duration::from_millis(1_000));
}

#[test]
fn dispatch_config_loads_partial_yaml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "answer_topic: replies\nresult_timeout_ms: null\npublish_retry:\n  max_attempts: 2"
    )
    .unwrap();

    let config = DispatchConfig::load(file.path()).unwrap();
    assert_eq!(config.work_topic, "workTopic");
    assert_eq!(config.answer_topic, "replies");
    assert_eq!(config.result_timeout_ms, None);
    assert_eq!(config.result_timeout(), None);
    assert_eq!(config.max_dispatch_attempts, 3);
    assert_eq!(config.publish_retry.max_attempts, 2);
    assert_eq!(config.publish_retry.initial_backoff_ms, 20);
}

#[test]
fn defaults_match_an_empty_document() {
    let config: DispatchConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, DispatchConfig::default());
    assert_eq!(config.result_timeout(), Some(Duration::from_secs(60)));
}

#[test]
fn config_errors_carry_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    let err = DispatchConfig::load(&missing).unwrap_err();
    assert!(matches!(err, SearchError::Config(ref info) if info.code == "read-config"));
    assert_eq!(
        err.info().context.get("path"),
        Some(&missing.display().to_string())
    );

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "max_dispatch_attempts: [nope]").unwrap();
    let err = DispatchConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, SearchError::Config(ref info) if info.code == "parse-config"));
}
