use std::collections::BTreeSet;
use std::fmt;

use ghd_core::SearchError;
use ghd_graph::{Edges, Graph, Vertex};
use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Test deciding whether a candidate separator is acceptable.
///
/// Implementations must be pure: the answer depends only on the three inputs
/// and the predicate's own configuration.
pub trait Predicate: fmt::Debug + Send + Sync {
    /// Stable wire tag of the strategy.
    fn tag(&self) -> &'static str;

    /// Checks `separator` against `graph` for the given balance factor.
    fn check(&self, graph: &Graph, separator: &Edges, balance_factor: usize) -> bool;

    /// Captures the predicate configuration.
    fn snapshot(&self) -> Result<Snapshot, SearchError>;
}

/// Every component left by the separator holds at most
/// `len * (bf - 1) / bf` units of the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancedCheck;

impl BalancedCheck {
    /// Wire tag of the strategy.
    pub const TAG: &'static str = "balanced";
}

impl Predicate for BalancedCheck {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn check(&self, graph: &Graph, separator: &Edges, balance_factor: usize) -> bool {
        if balance_factor == 0 {
            return false;
        }
        let bf = balance_factor as u128;
        let limit = graph.len() as u128 * (bf - 1) / bf;
        graph
            .components(separator)
            .iter()
            .all(|component| component.len() as u128 <= limit)
    }

    fn snapshot(&self) -> Result<Snapshot, SearchError> {
        Snapshot::capture(Self::TAG, self)
    }
}

/// Structural check for separators used as the parent of a decomposition
/// node.
///
/// The separator must cover the `conn` vertices, leave one component holding
/// more than half of the graph, and keep every uncovered `child` vertex in
/// that component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentCheck {
    /// Interface vertices the parent has to cover.
    pub conn: Vec<Vertex>,
    /// Vertices of the child the parent is built for.
    pub child: Vec<Vertex>,
}

impl ParentCheck {
    /// Wire tag of the strategy.
    pub const TAG: &'static str = "parent";

    /// Creates a check for the given interface and child vertices.
    pub fn new(conn: Vec<Vertex>, child: Vec<Vertex>) -> Self {
        Self { conn, child }
    }
}

impl Predicate for ParentCheck {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn check(&self, graph: &Graph, separator: &Edges, _balance_factor: usize) -> bool {
        let cover = separator.vertices();
        if !self.conn.iter().all(|v| cover.contains(v)) {
            return false;
        }
        let half = graph.len() / 2;
        let components = graph.components(separator);
        let Some(low) = components.iter().find(|c| c.len() > half) else {
            return false;
        };
        let low_vertices: BTreeSet<Vertex> = low.vertices();
        self.child
            .iter()
            .filter(|v| !cover.contains(v))
            .all(|v| low_vertices.contains(v))
    }

    fn snapshot(&self) -> Result<Snapshot, SearchError> {
        Snapshot::capture(Self::TAG, self)
    }
}
