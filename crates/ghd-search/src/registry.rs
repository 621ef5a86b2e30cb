use ghd_core::SearchError;

use crate::combination::CombinationIterator;
use crate::generator::Generator;
use crate::predicate::{BalancedCheck, ParentCheck, Predicate};
use crate::snapshot::{Registry, Snapshot};
use crate::split::SplitCombinationIterator;

/// Decoder tables for both wire variant families.
#[derive(Debug, Clone)]
pub struct Registries {
    /// Enumeration strategies.
    pub generators: Registry<dyn Generator>,
    /// Predicate strategies.
    pub predicates: Registry<dyn Predicate>,
}

impl Registries {
    /// Empty tables; every strategy has to be registered explicitly.
    pub fn empty() -> Self {
        Self {
            generators: Registry::new("generator"),
            predicates: Registry::new("predicate"),
        }
    }

    /// Tables holding the built-in strategies.
    pub fn standard() -> Result<Self, SearchError> {
        let mut registries = Self::empty();
        registries
            .generators
            .register(CombinationIterator::TAG, restore_combination)?
            .register(SplitCombinationIterator::TAG, restore_split)?;
        registries
            .predicates
            .register(BalancedCheck::TAG, restore_balanced)?
            .register(ParentCheck::TAG, restore_parent)?;
        Ok(registries)
    }
}

fn restore_combination(snapshot: &Snapshot) -> Result<Box<dyn Generator>, SearchError> {
    let state: CombinationIterator = snapshot.restore()?;
    state.validate()?;
    Ok(Box::new(state))
}

fn restore_split(snapshot: &Snapshot) -> Result<Box<dyn Generator>, SearchError> {
    let state: SplitCombinationIterator = snapshot.restore()?;
    state.validate()?;
    Ok(Box::new(state))
}

fn restore_balanced(snapshot: &Snapshot) -> Result<Box<dyn Predicate>, SearchError> {
    let state: BalancedCheck = snapshot.restore()?;
    Ok(Box::new(state))
}

fn restore_parent(snapshot: &Snapshot) -> Result<Box<dyn Predicate>, SearchError> {
    let state: ParentCheck = snapshot.restore()?;
    Ok(Box::new(state))
}
