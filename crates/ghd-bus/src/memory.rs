use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use ghd_core::errors::{ErrorInfo, SearchError};
use tracing::{debug, trace, warn};

use crate::config::BusConfig;
use crate::{dead_letter_topic, Bus, Delivery, Message, MessageId, ReceiveOutcome};

#[derive(Debug)]
struct Topic {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    closed: bool,
}

impl Topic {
    fn open() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            closed: false,
        }
    }
}

#[derive(Debug)]
struct Inner {
    config: BusConfig,
    topics: Mutex<BTreeMap<String, Topic>>,
    next_id: AtomicU64,
}

/// Process-local bus backed by one unbounded channel per topic.
///
/// Ignored deliveries are held back by the receiving loop for
/// `redelivery_delay_ms` and then put back on the topic with an incremented
/// attempt counter. Anything still held when the loop returns is requeued
/// immediately, so unacknowledged messages are never lost.
#[derive(Debug, Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl InMemoryBus {
    /// Creates an empty bus with the given delivery policy.
    pub fn new(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                topics: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Delivery policy in effect.
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Number of messages currently queued on `topic`, excluding deliveries
    /// held back by an active receiver.
    pub fn pending(&self, topic: &str) -> usize {
        self.topics()
            .map(|topics| topics.get(topic).map_or(0, |t| t.rx.len()))
            .unwrap_or(0)
    }

    /// Closes `topic`; later publishes and receives fail with a transport
    /// error.
    pub fn close_topic(&self, topic: &str) -> Result<(), SearchError> {
        let mut topics = self.topics()?;
        topics
            .entry(topic.to_owned())
            .or_insert_with(Topic::open)
            .closed = true;
        debug!(topic, "topic closed");
        Ok(())
    }

    fn topics(&self) -> Result<MutexGuard<'_, BTreeMap<String, Topic>>, SearchError> {
        self.inner.topics.lock().map_err(|_| {
            SearchError::Transport(ErrorInfo::new("bus-poisoned", "topic table lock poisoned"))
        })
    }

    fn channel(&self, topic: &str) -> Result<(Sender<Message>, Receiver<Message>), SearchError> {
        let mut topics = self.topics()?;
        let entry = topics.entry(topic.to_owned()).or_insert_with(Topic::open);
        if entry.closed {
            return Err(closed(topic));
        }
        Ok((entry.tx.clone(), entry.rx.clone()))
    }

    fn is_closed(&self, topic: &str) -> Result<bool, SearchError> {
        Ok(self.topics()?.get(topic).is_some_and(|t| t.closed))
    }

    fn enqueue(&self, tx: &Sender<Message>, message: Message) -> Result<(), SearchError> {
        tx.send(message).map_err(|err| {
            SearchError::Transport(
                ErrorInfo::new("send-failed", "topic channel disconnected")
                    .with_context("topic", &err.0.topic),
            )
        })
    }

    fn redeliver(&self, tx: &Sender<Message>, mut message: Message) -> Result<(), SearchError> {
        let exhausted = self
            .inner
            .config
            .max_delivery_attempts
            .is_some_and(|max| message.attempt >= max);
        if exhausted {
            let target = dead_letter_topic(&message.topic);
            warn!(
                topic = %message.topic,
                id = message.id.0,
                attempts = message.attempt,
                "delivery budget spent, dead-lettering message"
            );
            return match self.channel(&target) {
                Ok((dead_tx, _)) => {
                    message.topic = target;
                    self.enqueue(&dead_tx, message)
                }
                Err(err) => {
                    // keep it on its own topic rather than drop it
                    self.enqueue(tx, message)?;
                    Err(err)
                }
            };
        }
        message.attempt += 1;
        trace!(topic = %message.topic, id = message.id.0, attempt = message.attempt, "requeued");
        self.enqueue(tx, message)
    }

    /// Redelivers every message, returning the first failure once all of
    /// them have been tried.
    fn requeue_all(
        &self,
        tx: &Sender<Message>,
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<(), SearchError> {
        let mut first_error = None;
        for message in messages {
            if let Err(err) = self.redeliver(tx, message) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn drive(
        &self,
        topic: &str,
        deadline: Option<Instant>,
        handler: &mut dyn FnMut(&Message) -> Delivery,
        tx: &Sender<Message>,
        rx: &Receiver<Message>,
        held: &mut Vec<(Instant, Message)>,
    ) -> Result<ReceiveOutcome, SearchError> {
        let delay = self.inner.config.redelivery_delay();
        let poll = self.inner.config.poll_interval();
        loop {
            let now = Instant::now();
            let (due, waiting): (Vec<_>, Vec<_>) =
                held.drain(..).partition(|(visible_at, _)| *visible_at <= now);
            *held = waiting;
            self.requeue_all(tx, due.into_iter().map(|(_, message)| message))?;

            if self.is_closed(topic)? {
                return Err(closed(topic));
            }
            if deadline.is_some_and(|d| d <= now) {
                return Ok(ReceiveOutcome::DeadlineElapsed);
            }

            let mut wait = poll;
            if let Some(deadline) = deadline {
                wait = wait.min(deadline.saturating_duration_since(now));
            }
            if let Some(next) = held.iter().map(|(visible_at, _)| *visible_at).min() {
                wait = wait.min(next.saturating_duration_since(now));
            }

            let message = match rx.recv_timeout(wait) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SearchError::Transport(
                        ErrorInfo::new("receive-failed", "topic channel disconnected")
                            .with_context("topic", topic),
                    ))
                }
            };
            match handler(&message) {
                Delivery::Ack => {
                    trace!(topic, id = message.id.0, "acknowledged");
                }
                Delivery::AckAndCancel => {
                    trace!(topic, id = message.id.0, "acknowledged, cancelling receive");
                    return Ok(ReceiveOutcome::Cancelled);
                }
                Delivery::Ignore => {
                    held.push((Instant::now() + delay, message));
                }
            }
        }
    }
}

impl Bus for InMemoryBus {
    fn publish(&self, topic: &str, data: Vec<u8>) -> Result<MessageId, SearchError> {
        let (tx, _) = self.channel(topic)?;
        let id = MessageId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let bytes = data.len();
        self.enqueue(
            &tx,
            Message {
                id,
                topic: topic.to_owned(),
                data,
                attempt: 1,
            },
        )?;
        trace!(topic, id = id.0, bytes, "published");
        Ok(id)
    }

    fn receive(
        &self,
        topic: &str,
        deadline: Option<Instant>,
        handler: &mut dyn FnMut(&Message) -> Delivery,
    ) -> Result<ReceiveOutcome, SearchError> {
        let (tx, rx) = self.channel(topic)?;
        let mut held = Vec::new();
        let outcome = self.drive(topic, deadline, handler, &tx, &rx, &mut held);
        let requeued = self.requeue_all(&tx, held.into_iter().map(|(_, message)| message));
        let outcome = outcome?;
        requeued?;
        Ok(outcome)
    }
}

fn closed(topic: &str) -> SearchError {
    SearchError::Transport(
        ErrorInfo::new("topic-closed", "topic no longer accepts traffic").with_context("topic", topic),
    )
}
