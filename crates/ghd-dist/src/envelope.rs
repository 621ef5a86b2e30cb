//! Wire envelopes exchanged between coordinators and workers.

use ghd_core::errors::{ErrorInfo, SearchError};
use ghd_core::{CorrelationId, SchemaVersion, WIRE_SCHEMA};
use ghd_graph::{Edges, Graph};
use ghd_search::Snapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One unit of enumeration work, coordinator to worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTask {
    /// Envelope schema the task was written with.
    pub schema: SchemaVersion,
    /// Hypergraph the separator has to balance.
    pub subgraph: Graph,
    /// Edges the generator indices refer to, in index order.
    pub candidate_edges: Edges,
    /// Acceptance test to apply.
    pub predicate: Snapshot,
    /// Enumeration state to resume from.
    pub generator: Snapshot,
    /// Balance factor handed to the predicate.
    pub balance_factor: usize,
    /// Token the reply must carry.
    pub correlation_id: CorrelationId,
}

/// Outcome of one worker run, worker to coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Envelope schema the result was written with.
    pub schema: SchemaVersion,
    /// Echo of the task's correlation id.
    pub correlation_id: CorrelationId,
    /// Whether a satisfying selection was found.
    pub valid: bool,
    /// Indices into the task's candidate edges; empty unless `valid`.
    pub selection: Vec<usize>,
    /// Generator state after the run.
    pub generator: Snapshot,
}

impl SearchTask {
    /// Encodes the task for the bus.
    pub fn encode(&self) -> Result<Vec<u8>, SearchError> {
        encode(self, "task")
    }

    /// Decodes a task and checks its schema.
    pub fn decode(bytes: &[u8]) -> Result<Self, SearchError> {
        let task: Self = decode(bytes, "task")?;
        WIRE_SCHEMA.ensure_compatible(&task.schema)?;
        Ok(task)
    }
}

impl SearchResult {
    /// Encodes the result for the bus.
    pub fn encode(&self) -> Result<Vec<u8>, SearchError> {
        encode(self, "result")
    }

    /// Decodes a result and checks its schema.
    pub fn decode(bytes: &[u8]) -> Result<Self, SearchError> {
        let result: Self = decode(bytes, "result")?;
        WIRE_SCHEMA.ensure_compatible(&result.schema)?;
        Ok(result)
    }

    /// Fails unless `valid` agrees with the selection being non-empty.
    pub fn ensure_consistent(&self) -> Result<(), SearchError> {
        if self.valid == self.selection.is_empty() {
            return Err(SearchError::Decode(
                ErrorInfo::new(
                    "inconsistent-result",
                    "valid flag disagrees with the selection",
                )
                .with_context("correlation_id", &self.correlation_id)
                .with_context("valid", self.valid)
                .with_context("selection_len", self.selection.len()),
            ));
        }
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T, kind: &str) -> Result<Vec<u8>, SearchError> {
    bincode::serialize(value).map_err(|err| {
        SearchError::Decode(
            ErrorInfo::new("envelope-encode", err.to_string()).with_context("kind", kind),
        )
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8], kind: &str) -> Result<T, SearchError> {
    bincode::deserialize(bytes).map_err(|err| {
        SearchError::Decode(
            ErrorInfo::new("envelope-decode", err.to_string())
                .with_context("kind", kind)
                .with_context("bytes", bytes.len()),
        )
    })
}
