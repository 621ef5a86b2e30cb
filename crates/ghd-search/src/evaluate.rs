use ghd_core::SearchError;
use ghd_graph::{get_subset, Edges, Graph};
use tracing::trace;

use crate::generator::Generator;
use crate::predicate::Predicate;

/// Result of driving a generator against a predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Satisfying index combination, empty when none was found.
    pub selection: Vec<usize>,
    /// Number of combinations checked during the run.
    pub evaluated: u64,
}

impl Outcome {
    /// Whether a satisfying combination was found.
    pub fn is_valid(&self) -> bool {
        !self.selection.is_empty()
    }
}

/// Runs `generator` until a combination of `candidates` satisfies
/// `predicate` on `graph` or the generator is exhausted.
///
/// On success the generator has already confirmed the winning combination,
/// so its state resumes right after it.
pub fn run_to_completion(
    graph: &Graph,
    candidates: &Edges,
    predicate: &dyn Predicate,
    generator: &mut dyn Generator,
    balance_factor: usize,
) -> Result<Outcome, SearchError> {
    let mut outcome = Outcome::default();
    while generator.has_next() && outcome.selection.is_empty() {
        let indices = generator.get_next()?;
        outcome.evaluated += 1;
        let separator = get_subset(candidates, &indices)?;
        if predicate.check(graph, &separator, balance_factor) {
            generator.found();
            trace!(?indices, "combination satisfies {}", predicate.tag());
            outcome.selection = indices;
        }
        generator.confirm();
    }
    Ok(outcome)
}
