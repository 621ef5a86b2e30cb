use ghd_core::errors::{ErrorInfo, SearchError};
use serde::{Deserialize, Serialize};

use crate::combination::CombinationIterator;
use crate::generator::Generator;
use crate::snapshot::Snapshot;

/// One shard of a pre-partitioned k-combination space.
///
/// Shard `i` of `m` yields combinations `i, i + m, i + 2m, ...` of the
/// lexicographic sequence, so the shards are disjoint and together cover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCombinationIterator {
    shard: usize,
    shards: usize,
    inner: CombinationIterator,
}

impl SplitCombinationIterator {
    /// Wire tag of the strategy.
    pub const TAG: &'static str = "split-combination";

    /// Creates shard `shard` of `shards` (clamped to at least one shard).
    pub fn new(n: usize, k: usize, shard: usize, shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shard,
            shards,
            inner: CombinationIterator::strided(n, k, shard, shards),
        }
    }

    /// Index of this shard.
    pub fn shard(&self) -> usize {
        self.shard
    }

    /// Total number of shards the space was split into.
    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Combinations reported through `found`, oldest first.
    pub fn found_positions(&self) -> &[Vec<usize>] {
        self.inner.found_positions()
    }

    /// Checks a decoded state before it is allowed to run.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.shards == 0 || self.shard >= self.shards {
            return Err(SearchError::Decode(
                ErrorInfo::new("invalid-generator-state", "shard index outside the split")
                    .with_context("tag", Self::TAG)
                    .with_context("shard", self.shard)
                    .with_context("shards", self.shards),
            ));
        }
        self.inner
            .validate()
            .map_err(|err| err.with_context("tag", Self::TAG))
    }
}

/// Splits the k-combinations of `0..n` into `shards` disjoint iterators.
pub fn split_combinations(n: usize, k: usize, shards: usize) -> Vec<SplitCombinationIterator> {
    let shards = shards.max(1);
    (0..shards)
        .map(|shard| SplitCombinationIterator::new(n, k, shard, shards))
        .collect()
}

impl Generator for SplitCombinationIterator {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn get_next(&mut self) -> Result<Vec<usize>, SearchError> {
        self.inner
            .get_next()
            .map_err(|err| err.with_context("shard", format!("{}/{}", self.shard, self.shards)))
    }

    fn found(&mut self) {
        self.inner.found();
    }

    fn confirm(&mut self) {
        self.inner.confirm();
    }

    fn peek(&self) -> Option<&[usize]> {
        self.inner.peek()
    }

    fn snapshot(&self) -> Result<Snapshot, SearchError> {
        Snapshot::capture(Self::TAG, self)
    }
}
