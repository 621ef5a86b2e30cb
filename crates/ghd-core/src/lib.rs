#![deny(missing_docs)]

//! Core types shared by the distributed separator search crates: the error
//! taxonomy, envelope schema versions and correlation identifiers.

mod correlation;
pub mod errors;
pub mod provenance;

pub use correlation::CorrelationId;
pub use errors::{ErrorInfo, SearchError};
pub use provenance::SchemaVersion;

/// Schema version stamped on every envelope produced by this workspace.
pub const WIRE_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);
