use std::fmt;
use std::time::Instant;

use ghd_bus::{Bus, Delivery};
use ghd_core::errors::{ErrorInfo, SearchError};
use ghd_core::{CorrelationId, WIRE_SCHEMA};
use ghd_graph::{Edges, Graph};
use ghd_search::{
    single_generator, Generator, Predicate, Registries, Search, SearchFactory, Snapshot,
};
use tracing::{debug, info, trace, warn};

use crate::config::DispatchConfig;
use crate::envelope::{SearchResult, SearchTask};
use crate::retry::publish_with_retry;

/// Source of correlation ids for dispatched tasks.
pub type IdSource = Box<dyn FnMut() -> CorrelationId + Send>;

/// Phase of a coordinator session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ready to dispatch the next round.
    Idle,
    /// Publishing a task.
    Dispatching,
    /// Waiting for the reply carrying the dispatched id.
    AwaitingResult,
    /// Folding an accepted reply into the session.
    Merging,
    /// The search space is exhausted.
    Exhausted,
}

/// Coordinator offloading each search round to a worker over the bus.
///
/// Only one task is in flight at a time. The generator snapshot travels with
/// the task and comes back with the reply, which then replaces the held
/// generator; the held copy is only reused to re-dispatch a round whose reply
/// never arrived.
pub struct DistributedSearch<B: Bus> {
    bus: B,
    registries: Registries,
    config: DispatchConfig,
    graph: Graph,
    edges: Edges,
    balance_factor: usize,
    generator: Box<dyn Generator>,
    result: Vec<usize>,
    state: SessionState,
    rounds: u64,
    dispatches: u64,
    next_id: IdSource,
}

impl<B: Bus> DistributedSearch<B> {
    /// Creates a session; fails if the generator's tag is not registered.
    pub fn new(
        bus: B,
        registries: Registries,
        config: DispatchConfig,
        graph: Graph,
        edges: Edges,
        balance_factor: usize,
        generator: Box<dyn Generator>,
    ) -> Result<Self, SearchError> {
        registries.generators.ensure_registered(generator.tag())?;
        Ok(Self {
            bus,
            registries,
            config,
            graph,
            edges,
            balance_factor,
            generator,
            result: Vec::new(),
            state: SessionState::Idle,
            rounds: 0,
            dispatches: 0,
            next_id: Box::new(CorrelationId::fresh),
        })
    }

    /// Replaces the correlation id source.
    pub fn with_id_source(
        mut self,
        source: impl FnMut() -> CorrelationId + Send + 'static,
    ) -> Self {
        self.next_id = Box::new(source);
        self
    }

    /// Runs one round: dispatch, await the matching reply and merge it.
    ///
    /// Retryable failures re-dispatch from the held generator with a fresh id
    /// until `max_dispatch_attempts` is spent.
    pub fn advance(&mut self, predicate: &dyn Predicate) -> Result<(), SearchError> {
        if self.state == SessionState::Exhausted {
            return Ok(());
        }
        self.registries.predicates.ensure_registered(predicate.tag())?;
        let predicate = predicate.snapshot()?;
        let generator = self.generator.snapshot()?;

        let max_attempts = self.config.max_dispatch_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.round_trip(&predicate, &generator) {
                Ok((result, restored)) => {
                    self.merge(result, restored);
                    return Ok(());
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(attempt, error = %err, "round failed, re-dispatching");
                    self.transition(SessionState::Idle);
                    attempt += 1;
                }
                Err(err) => {
                    self.transition(SessionState::Idle);
                    return Err(err.with_context("dispatch_attempts", attempt));
                }
            }
        }
    }

    /// Whether the search space has been exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.state == SessionState::Exhausted
    }

    /// Selection merged by the last round, empty if none.
    pub fn current_result(&self) -> &[usize] {
        &self.result
    }

    /// Current phase.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Generator held by the session.
    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    /// Rounds merged so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Tasks published so far, including re-dispatches.
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "session state");
            self.state = next;
        }
    }

    fn round_trip(
        &mut self,
        predicate: &Snapshot,
        generator: &Snapshot,
    ) -> Result<(SearchResult, Box<dyn Generator>), SearchError> {
        self.transition(SessionState::Dispatching);
        let correlation_id = (self.next_id)();
        let task = SearchTask {
            schema: WIRE_SCHEMA,
            subgraph: self.graph.clone(),
            candidate_edges: self.edges.clone(),
            predicate: predicate.clone(),
            generator: generator.clone(),
            balance_factor: self.balance_factor,
            correlation_id: correlation_id.clone(),
        };
        let bytes = task.encode()?;
        publish_with_retry(
            &self.bus,
            &self.config.work_topic,
            &bytes,
            &self.config.publish_retry,
        )?;
        self.dispatches += 1;
        info!(
            correlation_id = %correlation_id,
            generator = generator.tag(),
            "task dispatched"
        );

        self.transition(SessionState::AwaitingResult);
        let result = self.await_result(&correlation_id)?;
        self.transition(SessionState::Merging);
        result.ensure_consistent()?;
        if result.generator.tag() != generator.tag() {
            return Err(SearchError::Decode(
                ErrorInfo::new(
                    "generator-tag-mismatch",
                    "reply carries a different generator variant",
                )
                .with_context("correlation_id", &correlation_id)
                .with_context("expected", generator.tag())
                .with_context("found", result.generator.tag()),
            ));
        }
        let restored = self.registries.generators.restore(&result.generator)?;
        Ok((result, restored))
    }

    fn await_result(&self, correlation_id: &CorrelationId) -> Result<SearchResult, SearchError> {
        let deadline = self.config.result_timeout().map(|t| Instant::now() + t);
        let mut accepted = None;
        self.bus
            .receive(&self.config.answer_topic, deadline, &mut |message| {
                match SearchResult::decode(&message.data) {
                    Err(err) => {
                        warn!(
                            id = message.id.0,
                            attempt = message.attempt,
                            error = %err,
                            "undecodable reply left unacknowledged"
                        );
                        Delivery::Ignore
                    }
                    Ok(result) if &result.correlation_id != correlation_id => {
                        trace!(
                            awaited = %correlation_id,
                            received = %result.correlation_id,
                            "reply for another dispatch"
                        );
                        Delivery::Ignore
                    }
                    Ok(result) => {
                        accepted = Some(result);
                        Delivery::AckAndCancel
                    }
                }
            })?;
        accepted.ok_or_else(|| {
            let mut info = ErrorInfo::new("result-timeout", "no matching reply before the deadline")
                .with_context("correlation_id", correlation_id);
            if let Some(ms) = self.config.result_timeout_ms {
                info = info.with_context("timeout_ms", ms);
            }
            SearchError::Timeout(info)
        })
    }

    fn merge(&mut self, result: SearchResult, generator: Box<dyn Generator>) {
        self.generator = generator;
        self.rounds += 1;
        info!(
            correlation_id = %result.correlation_id,
            valid = result.valid,
            selection = ?result.selection,
            round = self.rounds,
            "reply merged"
        );
        self.result = result.selection;
        if self.result.is_empty() {
            self.transition(SessionState::Exhausted);
        } else {
            self.transition(SessionState::Idle);
        }
    }
}

impl<B: Bus> fmt::Debug for DistributedSearch<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedSearch")
            .field("state", &self.state)
            .field("generator", &self.generator)
            .field("result", &self.result)
            .field("rounds", &self.rounds)
            .field("dispatches", &self.dispatches)
            .finish_non_exhaustive()
    }
}

impl<B: Bus> Search for DistributedSearch<B> {
    fn advance(&mut self, predicate: &dyn Predicate) -> Result<(), SearchError> {
        DistributedSearch::advance(self, predicate)
    }

    fn is_exhausted(&self) -> bool {
        DistributedSearch::is_exhausted(self)
    }

    fn current_result(&self) -> &[usize] {
        DistributedSearch::current_result(self)
    }
}

/// Builds [`DistributedSearch`] sessions sharing one bus client.
#[derive(Debug, Clone)]
pub struct DistributedSearchFactory<B: Bus + Clone> {
    bus: B,
    registries: Registries,
    config: DispatchConfig,
}

impl<B: Bus + Clone> DistributedSearchFactory<B> {
    /// Creates a factory handing `bus` to every session.
    pub fn new(bus: B, registries: Registries, config: DispatchConfig) -> Self {
        Self {
            bus,
            registries,
            config,
        }
    }
}

impl<B: Bus + Clone + 'static> SearchFactory for DistributedSearchFactory<B> {
    fn get_search(
        &self,
        graph: Graph,
        edges: Edges,
        balance_factor: usize,
        generators: Vec<Box<dyn Generator>>,
    ) -> Result<Box<dyn Search>, SearchError> {
        let generator = single_generator(generators)?;
        let session = DistributedSearch::new(
            self.bus.clone(),
            self.registries.clone(),
            self.config.clone(),
            graph,
            edges,
            balance_factor,
            generator,
        )?;
        Ok(Box::new(session))
    }
}
