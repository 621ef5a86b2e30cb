//! Schema descriptors stamped on every wire envelope.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, SearchError};

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Fails with a decode error unless `other` shares this major version.
    pub fn ensure_compatible(&self, other: &SchemaVersion) -> Result<(), SearchError> {
        if self.major != other.major {
            return Err(SearchError::Decode(
                ErrorInfo::new("schema-mismatch", "envelope schema major version differs")
                    .with_context("expected", self)
                    .with_context("found", other),
            ));
        }
        Ok(())
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
