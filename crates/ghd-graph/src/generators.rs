use ghd_core::errors::{ErrorInfo, SearchError};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::edge::{Edge, Edges, Vertex};
use crate::graph::Graph;

/// Shape parameters for [`random_graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomGraphConfig {
    /// Number of hyperedges to generate.
    pub edges: usize,
    /// Size of the vertex pool edges draw from.
    pub vertices: usize,
    /// Maximum number of vertices per edge (at least one).
    pub max_arity: usize,
}

impl Default for RandomGraphConfig {
    fn default() -> Self {
        Self {
            edges: 10,
            vertices: 12,
            max_arity: 3,
        }
    }
}

/// Generates a hypergraph with deterministic randomness.
///
/// Edge `i` is named `i + 1`; every edge has between one and `max_arity`
/// distinct vertices drawn from `1..=vertices`.
pub fn random_graph(config: &RandomGraphConfig, seed: u64) -> Result<Graph, SearchError> {
    if config.vertices == 0 || config.max_arity == 0 {
        return Err(SearchError::Graph(
            ErrorInfo::new("empty-vertex-pool", "random graphs need vertices and a positive arity")
                .with_context("vertices", config.vertices)
                .with_context("max_arity", config.max_arity),
        ));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let arity_cap = config.max_arity.min(config.vertices);
    let edges: Edges = (0..config.edges)
        .map(|index| {
            let arity = rng.gen_range(1..=arity_cap);
            let vertices = sample(&mut rng, config.vertices, arity)
                .into_iter()
                .map(|v| v as Vertex + 1);
            Edge::new(index as u32 + 1, vertices)
        })
        .collect();
    Ok(Graph::new(edges))
}
