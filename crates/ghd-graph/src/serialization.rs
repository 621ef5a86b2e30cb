use ghd_core::errors::{ErrorInfo, SearchError};

use crate::graph::Graph;

/// Serializes the graph to a compact binary representation using `bincode`.
pub fn graph_to_bytes(graph: &Graph) -> Result<Vec<u8>, SearchError> {
    bincode::serialize(graph)
        .map_err(|err| SearchError::Decode(ErrorInfo::new("serialize-bytes", err.to_string())))
}

/// Restores a graph from its binary representation.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<Graph, SearchError> {
    bincode::deserialize(bytes)
        .map_err(|err| SearchError::Decode(ErrorInfo::new("deserialize-bytes", err.to_string())))
}

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &Graph) -> Result<String, SearchError> {
    serde_json::to_string_pretty(graph)
        .map_err(|err| SearchError::Decode(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<Graph, SearchError> {
    serde_json::from_str(json)
        .map_err(|err| SearchError::Decode(ErrorInfo::new("deserialize-json", err.to_string())))
}
