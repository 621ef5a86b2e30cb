#![deny(missing_docs)]

//! Resumable enumeration of separator candidates.
//!
//! A [`Generator`] hands out index combinations over the candidate edges, a
//! [`Predicate`] decides whether the selected edges separate the graph, and
//! [`run_to_completion`] drives one against the other. Both capabilities
//! travel between processes as tagged [`Snapshot`]s that a [`Registry`]
//! turns back into live objects.

mod combination;
mod evaluate;
mod generator;
mod predicate;
mod registry;
mod search;
mod snapshot;
mod split;

pub use combination::CombinationIterator;
pub use evaluate::{run_to_completion, Outcome};
pub use generator::Generator;
pub use predicate::{BalancedCheck, ParentCheck, Predicate};
pub use registry::Registries;
pub use search::{single_generator, LocalSearch, LocalSearchFactory, Search, SearchFactory};
pub use snapshot::{Decoder, Registry, Snapshot};
pub use split::{split_combinations, SplitCombinationIterator};
