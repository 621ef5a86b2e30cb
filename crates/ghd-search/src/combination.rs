use ghd_core::errors::{ErrorInfo, SearchError};
use serde::{Deserialize, Serialize};

use crate::generator::Generator;
use crate::snapshot::Snapshot;

/// Lexicographic k-combinations of `0..n`.
///
/// The iterator can start at any offset into the sequence and stride over it
/// with `step_size`, which is how split shards partition the space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationIterator {
    n: usize,
    k: usize,
    combination: Vec<usize>,
    step_size: usize,
    outstanding: bool,
    exhausted: bool,
    found: Vec<Vec<usize>>,
    confirmed: u64,
}

impl CombinationIterator {
    /// Wire tag of the strategy.
    pub const TAG: &'static str = "combination";

    /// Iterates every k-combination of `0..n` in lexicographic order.
    pub fn new(n: usize, k: usize) -> Self {
        Self::strided(n, k, 0, 1)
    }

    /// Starts at combination number `offset` and advances `step_size`
    /// combinations per confirm. A zero step is treated as one.
    pub fn strided(n: usize, k: usize, offset: usize, step_size: usize) -> Self {
        let mut iterator = Self {
            n,
            k,
            combination: (0..k).collect(),
            step_size: step_size.max(1),
            outstanding: false,
            exhausted: k == 0 || k > n,
            found: Vec::new(),
            confirmed: 0,
        };
        if !iterator.exhausted && !skip(&mut iterator.combination, n, offset) {
            iterator.exhausted = true;
        }
        iterator
    }

    /// Size of the index universe.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Size of each combination.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Combinations reported through `found`, oldest first.
    pub fn found_positions(&self) -> &[Vec<usize>] {
        &self.found
    }

    /// Number of combinations settled so far.
    pub fn confirmed(&self) -> u64 {
        self.confirmed
    }

    /// Checks a decoded state before it is allowed to run.
    ///
    /// A live cursor must hold `k` strictly increasing indices below `n`; an
    /// exhausted one may not have a combination outstanding.
    pub fn validate(&self) -> Result<(), SearchError> {
        let reject = |reason: &str| {
            Err(SearchError::Decode(
                ErrorInfo::new("invalid-generator-state", reason.to_owned())
                    .with_context("tag", Self::TAG)
                    .with_context("n", self.n)
                    .with_context("k", self.k)
                    .with_context("combination", format!("{:?}", self.combination)),
            ))
        };
        if self.step_size == 0 {
            return reject("step size must be positive");
        }
        if self.combination.len() != self.k {
            return reject("combination length differs from k");
        }
        if self.combination.windows(2).any(|pair| pair[0] >= pair[1]) {
            return reject("combination is not strictly increasing");
        }
        if self.exhausted {
            if self.outstanding {
                return reject("exhausted generator has an outstanding combination");
            }
            return Ok(());
        }
        if self.k == 0 || self.k > self.n {
            return reject("live generator needs 0 < k <= n");
        }
        if self.combination.iter().any(|&index| index >= self.n) {
            return reject("combination index out of range");
        }
        Ok(())
    }
}

impl Generator for CombinationIterator {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn has_next(&self) -> bool {
        if self.exhausted {
            return false;
        }
        if !self.outstanding {
            return true;
        }
        let mut lookahead = self.combination.clone();
        skip(&mut lookahead, self.n, self.step_size)
    }

    fn get_next(&mut self) -> Result<Vec<usize>, SearchError> {
        if self.outstanding {
            return Err(SearchError::Contract(
                ErrorInfo::new("confirm-required", "previous combination was not confirmed")
                    .with_context("combination", format!("{:?}", self.combination)),
            ));
        }
        if self.exhausted {
            return Err(SearchError::Exhausted(
                ErrorInfo::new("no-combinations-left", "get_next called on exhausted generator")
                    .with_context("n", self.n)
                    .with_context("k", self.k),
            ));
        }
        self.outstanding = true;
        Ok(self.combination.clone())
    }

    fn found(&mut self) {
        if self.outstanding && !self.found.contains(&self.combination) {
            self.found.push(self.combination.clone());
        }
    }

    fn confirm(&mut self) {
        if !self.outstanding {
            return;
        }
        self.outstanding = false;
        self.confirmed += 1;
        if !skip(&mut self.combination, self.n, self.step_size) {
            self.exhausted = true;
        }
    }

    fn peek(&self) -> Option<&[usize]> {
        (!self.exhausted).then_some(self.combination.as_slice())
    }

    fn snapshot(&self) -> Result<Snapshot, SearchError> {
        Snapshot::capture(Self::TAG, self)
    }
}

/// Moves `combination` forward by `steps` positions; false once it runs off
/// the end.
fn skip(combination: &mut [usize], n: usize, steps: usize) -> bool {
    (0..steps).all(|_| advance(combination, n))
}

fn advance(combination: &mut [usize], n: usize) -> bool {
    let k = combination.len();
    for i in (0..k).rev() {
        if combination[i] < n - k + i {
            combination[i] += 1;
            for j in i + 1..k {
                combination[j] = combination[j - 1] + 1;
            }
            return true;
        }
    }
    false
}
