use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ghd_bus::{Bus, Delivery, Message};
use ghd_core::{SearchError, WIRE_SCHEMA};
use ghd_graph::canonical_hash;
use ghd_search::{run_to_completion, Registries};
use tracing::{debug, error, info, warn};

use crate::config::DispatchConfig;
use crate::envelope::{SearchResult, SearchTask};
use crate::retry::publish_with_retry;

const SERVE_SLICE: Duration = Duration::from_millis(50);

/// Counters reported by [`Worker::serve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    /// Deliveries handed to the worker.
    pub handled: u64,
    /// Tasks answered and acknowledged.
    pub acknowledged: u64,
    /// Deliveries left for redelivery.
    pub ignored: u64,
}

/// Stateless task executor.
///
/// Each task is self-contained: the worker rebuilds predicate and generator
/// from the envelope, runs the evaluation loop and answers on the answer
/// topic. Nothing survives between tasks.
#[derive(Debug)]
pub struct Worker<B: Bus> {
    bus: B,
    registries: Registries,
    config: DispatchConfig,
}

impl<B: Bus> Worker<B> {
    /// Creates a worker answering through `bus`.
    pub fn new(bus: B, registries: Registries, config: DispatchConfig) -> Self {
        Self {
            bus,
            registries,
            config,
        }
    }

    /// Evaluates `task` and builds the reply without publishing it.
    pub fn run(&self, task: &SearchTask) -> Result<SearchResult, SearchError> {
        let predicate = self.registries.predicates.restore(&task.predicate)?;
        let mut generator = self.registries.generators.restore(&task.generator)?;
        let outcome = run_to_completion(
            &task.subgraph,
            &task.candidate_edges,
            predicate.as_ref(),
            generator.as_mut(),
            task.balance_factor,
        )
        .map_err(|err| match generator.peek() {
            Some(position) => err.with_context("position", format!("{position:?}")),
            None => err,
        })?;
        debug!(
            correlation_id = %task.correlation_id,
            evaluated = outcome.evaluated,
            valid = outcome.is_valid(),
            "task evaluated"
        );
        Ok(SearchResult {
            schema: WIRE_SCHEMA,
            correlation_id: task.correlation_id.clone(),
            valid: outcome.is_valid(),
            selection: outcome.selection,
            generator: generator.snapshot()?,
        })
    }

    /// Handles one delivery from the work topic.
    ///
    /// The task is acknowledged only once its reply has been published; every
    /// failure leaves it for redelivery.
    pub fn handle(&self, message: &Message) -> Delivery {
        let task = match SearchTask::decode(&message.data) {
            Ok(task) => task,
            Err(err) => {
                warn!(
                    id = message.id.0,
                    attempt = message.attempt,
                    error = %err,
                    "undecodable task left unacknowledged"
                );
                return Delivery::Ignore;
            }
        };
        match self.answer(&task) {
            Ok(result) => {
                info!(
                    correlation_id = %task.correlation_id,
                    valid = result.valid,
                    selection = ?result.selection,
                    "task answered"
                );
                Delivery::Ack
            }
            Err(err) => {
                error!(
                    correlation_id = %task.correlation_id,
                    generator = task.generator.tag(),
                    snapshot_bytes = task.generator.state_len(),
                    graph_edges = task.subgraph.len(),
                    graph_hash = %canonical_hash(&task.subgraph),
                    error = %err,
                    "task failed"
                );
                Delivery::Ignore
            }
        }
    }

    /// Receives on the work topic until `stop` is raised.
    pub fn serve(&self, stop: &AtomicBool) -> Result<ServeSummary, SearchError> {
        let mut summary = ServeSummary::default();
        info!(topic = %self.config.work_topic, "worker serving");
        while !stop.load(Ordering::Acquire) {
            self.bus.receive(
                &self.config.work_topic,
                Some(Instant::now() + SERVE_SLICE),
                &mut |message| {
                    summary.handled += 1;
                    let delivery = self.handle(message);
                    match delivery {
                        Delivery::Ignore => summary.ignored += 1,
                        _ => summary.acknowledged += 1,
                    }
                    delivery
                },
            )?;
        }
        info!(
            handled = summary.handled,
            acknowledged = summary.acknowledged,
            ignored = summary.ignored,
            "worker stopped"
        );
        Ok(summary)
    }

    fn answer(&self, task: &SearchTask) -> Result<SearchResult, SearchError> {
        let result = self.run(task)?;
        let bytes = result.encode()?;
        publish_with_retry(
            &self.bus,
            &self.config.answer_topic,
            &bytes,
            &self.config.publish_retry,
        )?;
        Ok(result)
    }
}
