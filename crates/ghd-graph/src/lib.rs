#![deny(missing_docs)]

//! Hypergraph types consumed by the separator search: ordered candidate edge
//! sets, subset selection, component splitting and serialization.

mod edge;
mod generators;
mod graph;
mod hash;
mod serialization;

pub use edge::{get_subset, Edge, Edges, Vertex};
pub use generators::{random_graph, RandomGraphConfig};
pub use graph::Graph;
pub use hash::canonical_hash;

/// Re-export serialization helpers for downstream crates.
pub use serialization::{graph_from_bytes, graph_from_json, graph_to_bytes, graph_to_json};
