use std::collections::BTreeSet;

use ghd_core::errors::{ErrorInfo, SearchError};
use serde::{Deserialize, Serialize};

/// Vertex identifier inside a hypergraph.
pub type Vertex = u32;

/// A named hyperedge over a set of vertices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Stable edge name taken from the input encoding.
    pub name: u32,
    /// Vertices covered by the edge, sorted and deduplicated.
    pub vertices: Vec<Vertex>,
}

impl Edge {
    /// Creates an edge, canonicalising its vertex list.
    pub fn new(name: u32, vertices: impl IntoIterator<Item = Vertex>) -> Self {
        let set: BTreeSet<Vertex> = vertices.into_iter().collect();
        Self {
            name,
            vertices: set.into_iter().collect(),
        }
    }

    /// Returns whether every vertex of the edge lies in `cover`.
    pub fn covered_by(&self, cover: &BTreeSet<Vertex>) -> bool {
        self.vertices.iter().all(|v| cover.contains(v))
    }
}

/// Ordered collection of edges.
///
/// The position of an edge is its candidate index: enumerators hand out
/// index combinations that [`get_subset`] resolves against this order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Edges {
    slice: Vec<Edge>,
}

impl Edges {
    /// Wraps the provided edges, keeping their order.
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { slice: edges }
    }

    /// Number of edges in the collection.
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    /// Whether the collection holds no edges.
    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    /// Returns the edge at `index`.
    pub fn get(&self, index: usize) -> Option<&Edge> {
        self.slice.get(index)
    }

    /// Iterates over the edges in candidate order.
    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.slice.iter()
    }

    /// Returns the edges as a slice.
    pub fn as_slice(&self) -> &[Edge] {
        &self.slice
    }

    /// Union of all vertices covered by the edges.
    pub fn vertices(&self) -> BTreeSet<Vertex> {
        self.slice
            .iter()
            .flat_map(|edge| edge.vertices.iter().copied())
            .collect()
    }

    /// Names of the edges in order.
    pub fn names(&self) -> Vec<u32> {
        self.slice.iter().map(|edge| edge.name).collect()
    }
}

impl FromIterator<Edge> for Edges {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Edges {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.slice.iter()
    }
}

/// Selects the edges at the given candidate indices, in index order.
pub fn get_subset(edges: &Edges, indices: &[usize]) -> Result<Edges, SearchError> {
    indices
        .iter()
        .map(|&index| {
            edges.get(index).cloned().ok_or_else(|| {
                SearchError::Graph(
                    ErrorInfo::new("index-out-of-range", "selection index exceeds candidate edges")
                        .with_context("index", index)
                        .with_context("candidates", edges.len()),
                )
            })
        })
        .collect()
}
