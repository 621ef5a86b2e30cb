#![deny(missing_docs)]

//! Separator search offloaded to workers over a message bus.
//!
//! A [`DistributedSearch`] coordinator packs the graph, the candidate edges
//! and the generator and predicate snapshots into a [`SearchTask`], publishes
//! it on the work topic and waits on the answer topic for the
//! [`SearchResult`] carrying the same correlation id. A [`Worker`] on the
//! other side restores both strategies, runs the evaluation loop and replies
//! with the advanced generator.

mod config;
mod coordinator;
mod envelope;
mod retry;
mod worker;

pub use config::{DispatchConfig, RetryPolicy};
pub use coordinator::{DistributedSearch, DistributedSearchFactory, IdSource, SessionState};
pub use envelope::{SearchResult, SearchTask};
pub use retry::publish_with_retry;
pub use worker::{ServeSummary, Worker};
