#![deny(missing_docs)]

//! Publish/subscribe primitives shared by coordinators and workers.
//!
//! A [`Bus`] accepts payloads on named topics and hands them to receivers one
//! at a time. Receivers answer every delivery with a [`Delivery`]: only an
//! acknowledgement removes a message, anything else leaves it eligible for
//! redelivery.

mod config;
mod memory;

use std::time::Instant;

use ghd_core::SearchError;

pub use config::BusConfig;
pub use memory::InMemoryBus;

/// Identifier assigned by the bus when it accepts a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

/// A message as seen by a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Bus-assigned identifier, stable across redeliveries.
    pub id: MessageId,
    /// Topic the message was published on.
    pub topic: String,
    /// Opaque payload.
    pub data: Vec<u8>,
    /// Delivery count, starting at one.
    pub attempt: u32,
}

/// Receiver verdict for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Acknowledge the message and keep receiving.
    Ack,
    /// Acknowledge the message and cancel the receive loop.
    AckAndCancel,
    /// Leave the message unacknowledged for later redelivery.
    Ignore,
}

/// Why a receive loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The handler cancelled the loop.
    Cancelled,
    /// The deadline passed first.
    DeadlineElapsed,
}

/// Message bus client.
///
/// Implementations must be cheap to share between threads; clients are passed
/// explicitly to every component that talks to the bus.
pub trait Bus: Send + Sync {
    /// Publishes `data` on `topic`, returning once the bus has accepted it.
    fn publish(&self, topic: &str, data: Vec<u8>) -> Result<MessageId, SearchError>;

    /// Delivers messages from `topic` to `handler` until it cancels or the
    /// deadline passes (`None` waits indefinitely).
    fn receive(
        &self,
        topic: &str,
        deadline: Option<Instant>,
        handler: &mut dyn FnMut(&Message) -> Delivery,
    ) -> Result<ReceiveOutcome, SearchError>;
}

impl<B: Bus + ?Sized> Bus for std::sync::Arc<B> {
    fn publish(&self, topic: &str, data: Vec<u8>) -> Result<MessageId, SearchError> {
        (**self).publish(topic, data)
    }

    fn receive(
        &self,
        topic: &str,
        deadline: Option<Instant>,
        handler: &mut dyn FnMut(&Message) -> Delivery,
    ) -> Result<ReceiveOutcome, SearchError> {
        (**self).receive(topic, deadline, handler)
    }
}

/// Name of the topic collecting messages that exceeded their delivery budget.
pub fn dead_letter_topic(topic: &str) -> String {
    format!("{topic}.dead-letter")
}
