use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::edge::{Edge, Edges, Vertex};

/// Hypergraph region searched for separators.
///
/// `special` holds edge groups that behave as a single hyperedge over the
/// union of their vertices; they count towards [`Graph::len`] and are never
/// split by a separator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Ordinary hyperedges.
    pub edges: Edges,
    /// Special edge groups.
    #[serde(default)]
    pub special: Vec<Edges>,
}

impl Graph {
    /// Creates a graph without special edges.
    pub fn new(edges: Edges) -> Self {
        Self {
            edges,
            special: Vec::new(),
        }
    }

    /// Creates a graph with special edge groups.
    pub fn with_special(edges: Edges, special: Vec<Edges>) -> Self {
        Self { edges, special }
    }

    /// Size measure used by balance checks: edges plus special groups.
    pub fn len(&self) -> usize {
        self.edges.len() + self.special.len()
    }

    /// Whether the graph has neither edges nor special groups.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All vertices covered by edges or special groups.
    pub fn vertices(&self) -> BTreeSet<Vertex> {
        let mut vertices = self.edges.vertices();
        for group in &self.special {
            vertices.extend(group.vertices());
        }
        vertices
    }

    /// Splits the graph into the components left after removing the
    /// separator's vertices.
    ///
    /// Two units (edges or special groups) share a component when they have a
    /// vertex in common outside the separator. Units fully covered by the
    /// separator belong to no component. Components are returned in order of
    /// their first unit.
    pub fn components(&self, separator: &Edges) -> Vec<Graph> {
        let cut = separator.vertices();
        let units: Vec<BTreeSet<Vertex>> = self
            .edges
            .iter()
            .map(|edge| edge.vertices.iter().copied().collect())
            .chain(self.special.iter().map(Edges::vertices))
            .map(|vertices: BTreeSet<Vertex>| vertices.difference(&cut).copied().collect())
            .collect();

        let mut forest = DisjointSet::new(units.len());
        let mut owner: BTreeMap<Vertex, usize> = BTreeMap::new();
        for (unit, vertices) in units.iter().enumerate() {
            for vertex in vertices {
                match owner.get(vertex) {
                    Some(&other) => forest.union(unit, other),
                    None => {
                        owner.insert(*vertex, unit);
                    }
                }
            }
        }

        let mut order: Vec<usize> = Vec::new();
        let mut grouped: BTreeMap<usize, (Vec<Edge>, Vec<Edges>)> = BTreeMap::new();
        let edge_count = self.edges.len();
        for (unit, vertices) in units.iter().enumerate() {
            if vertices.is_empty() {
                continue;
            }
            let root = forest.find(unit);
            let entry = grouped.entry(root).or_insert_with(|| {
                order.push(root);
                (Vec::new(), Vec::new())
            });
            if unit < edge_count {
                if let Some(edge) = self.edges.get(unit) {
                    entry.0.push(edge.clone());
                }
            } else if let Some(group) = self.special.get(unit - edge_count) {
                entry.1.push(group.clone());
            }
        }

        order
            .into_iter()
            .filter_map(|root| grouped.remove(&root))
            .map(|(edges, special)| Graph::with_special(Edges::new(edges), special))
            .collect()
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
