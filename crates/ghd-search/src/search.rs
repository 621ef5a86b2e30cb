use ghd_core::errors::{ErrorInfo, SearchError};
use ghd_graph::{Edges, Graph};
use tracing::debug;

use crate::evaluate::run_to_completion;
use crate::generator::Generator;
use crate::predicate::Predicate;

/// A separator search session.
///
/// `advance` runs one round from the current generator state; once a round
/// finds nothing the session is exhausted and further calls do nothing.
pub trait Search {
    /// Searches for the next separator satisfying `predicate`.
    fn advance(&mut self, predicate: &dyn Predicate) -> Result<(), SearchError>;

    /// Whether the remaining search space has been exhausted.
    fn is_exhausted(&self) -> bool;

    /// Last merged selection, empty if none.
    fn current_result(&self) -> &[usize];
}

/// Builds search sessions over a graph and its candidate edges.
pub trait SearchFactory {
    /// Creates a session driving the given generator shards.
    fn get_search(
        &self,
        graph: Graph,
        edges: Edges,
        balance_factor: usize,
        generators: Vec<Box<dyn Generator>>,
    ) -> Result<Box<dyn Search>, SearchError>;
}

/// Takes the single generator out of `generators`.
///
/// Sessions own exactly one generator; spreading shards over several sessions
/// is left to the caller.
pub fn single_generator(
    mut generators: Vec<Box<dyn Generator>>,
) -> Result<Box<dyn Generator>, SearchError> {
    if generators.len() != 1 {
        return Err(SearchError::Config(
            ErrorInfo::new("unsupported-sharding", "a session drives exactly one generator")
                .with_context("generators", generators.len())
                .with_hint("create one session per shard"),
        ));
    }
    generators
        .pop()
        .ok_or_else(|| SearchError::Config(ErrorInfo::new("no-generator", "no generator given")))
}

/// In-process search session running the evaluation loop directly.
#[derive(Debug)]
pub struct LocalSearch {
    graph: Graph,
    edges: Edges,
    balance_factor: usize,
    generator: Box<dyn Generator>,
    result: Vec<usize>,
    exhausted: bool,
    evaluated: u64,
}

impl LocalSearch {
    /// Creates a session over `graph` selecting from `edges`.
    pub fn new(
        graph: Graph,
        edges: Edges,
        balance_factor: usize,
        generator: Box<dyn Generator>,
    ) -> Self {
        Self {
            graph,
            edges,
            balance_factor,
            generator,
            result: Vec::new(),
            exhausted: false,
            evaluated: 0,
        }
    }

    /// Total number of combinations checked across all rounds.
    pub fn evaluated(&self) -> u64 {
        self.evaluated
    }

    /// The generator owned by the session.
    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }
}

impl Search for LocalSearch {
    fn advance(&mut self, predicate: &dyn Predicate) -> Result<(), SearchError> {
        if self.exhausted {
            return Ok(());
        }
        let outcome = run_to_completion(
            &self.graph,
            &self.edges,
            predicate,
            self.generator.as_mut(),
            self.balance_factor,
        )?;
        self.evaluated += outcome.evaluated;
        self.exhausted = !outcome.is_valid();
        debug!(
            evaluated = outcome.evaluated,
            exhausted = self.exhausted,
            "local round finished"
        );
        self.result = outcome.selection;
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn current_result(&self) -> &[usize] {
        &self.result
    }
}

/// Factory producing [`LocalSearch`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSearchFactory;

impl SearchFactory for LocalSearchFactory {
    fn get_search(
        &self,
        graph: Graph,
        edges: Edges,
        balance_factor: usize,
        generators: Vec<Box<dyn Generator>>,
    ) -> Result<Box<dyn Search>, SearchError> {
        let generator = single_generator(generators)?;
        Ok(Box::new(LocalSearch::new(
            graph,
            edges,
            balance_factor,
            generator,
        )))
    }
}
