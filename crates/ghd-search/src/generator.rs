use std::fmt;

use ghd_core::SearchError;

use crate::snapshot::Snapshot;

/// Resumable enumerator over candidate index combinations.
///
/// Every value handed out by [`Generator::get_next`] must be settled with
/// [`Generator::confirm`] before the next call; [`Generator::found`] may be
/// called in between to cache a satisfying position. A generator restored
/// from its [`Snapshot`] continues exactly where the original stopped.
pub trait Generator: fmt::Debug + Send {
    /// Stable wire tag of the strategy.
    fn tag(&self) -> &'static str;

    /// Whether another combination remains after the outstanding one.
    fn has_next(&self) -> bool;

    /// Hands out the next combination.
    ///
    /// Fails with [`SearchError::Exhausted`] when nothing remains and with
    /// [`SearchError::Contract`] when the previous value is unconfirmed.
    fn get_next(&mut self) -> Result<Vec<usize>, SearchError>;

    /// Marks the outstanding combination as satisfying the predicate.
    fn found(&mut self);

    /// Settles the outstanding combination and moves the cursor past it.
    fn confirm(&mut self);

    /// The combination the cursor currently points at, if any.
    fn peek(&self) -> Option<&[usize]>;

    /// Captures the full enumeration state.
    fn snapshot(&self) -> Result<Snapshot, SearchError>;
}
