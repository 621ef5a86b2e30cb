use sha2::{Digest, Sha256};

use crate::edge::Edges;
use crate::graph::Graph;

/// Computes the canonical structural hash for the provided graph.
///
/// Edge order is ignored; edge names and vertex sets are not.
pub fn canonical_hash(graph: &Graph) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"edges");
    encode_edges(&graph.edges, &mut hasher);

    let mut groups: Vec<Vec<(u32, Vec<u32>)>> = graph.special.iter().map(sorted_edges).collect();
    groups.sort();
    hasher.update(b"special");
    hasher.update((groups.len() as u64).to_le_bytes());
    for group in groups {
        encode_sorted(&group, &mut hasher);
    }

    format!("{:x}", hasher.finalize())
}

fn encode_edges(edges: &Edges, hasher: &mut Sha256) {
    encode_sorted(&sorted_edges(edges), hasher);
}

fn sorted_edges(edges: &Edges) -> Vec<(u32, Vec<u32>)> {
    let mut signatures: Vec<(u32, Vec<u32>)> = edges
        .iter()
        .map(|edge| (edge.name, edge.vertices.clone()))
        .collect();
    signatures.sort();
    signatures
}

fn encode_sorted(signatures: &[(u32, Vec<u32>)], hasher: &mut Sha256) {
    hasher.update((signatures.len() as u64).to_le_bytes());
    for (name, vertices) in signatures {
        hasher.update(name.to_le_bytes());
        hasher.update((vertices.len() as u64).to_le_bytes());
        for vertex in vertices {
            hasher.update(vertex.to_le_bytes());
        }
    }
}
