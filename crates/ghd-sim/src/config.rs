use std::fs;
use std::path::Path;

use clap::ValueEnum;
use ghd_bus::BusConfig;
use ghd_core::errors::{ErrorInfo, SearchError};
use ghd_dist::DispatchConfig;
use ghd_search::{BalancedCheck, ParentCheck, Predicate};
use serde::{Deserialize, Serialize};

/// YAML configuration of a simulated distributed search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Topics, timeouts and publish retry.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// In-memory bus delivery policy.
    #[serde(default)]
    pub bus: BusConfig,
    /// Search parameters.
    #[serde(default)]
    pub search: SearchSettings,
}

/// Separator size, balance factor and acceptance test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Number of edges per separator.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Components may hold at most `(bf - 1) / bf` of the graph's edges.
    #[serde(default = "default_balance_factor")]
    pub balance_factor: usize,
    /// Acceptance test applied to each candidate.
    #[serde(default)]
    pub predicate: PredicateKind,
}

fn default_k() -> usize {
    2
}

fn default_balance_factor() -> usize {
    2
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            k: default_k(),
            balance_factor: default_balance_factor(),
            predicate: PredicateKind::default(),
        }
    }
}

/// Predicate selectable from YAML or the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PredicateKind {
    /// Every component stays within the balance bound.
    #[default]
    Balanced,
    /// Structural parent check with empty `conn` and `child` sets.
    Parent,
}

impl PredicateKind {
    /// Instantiates the predicate.
    pub fn build(self) -> Box<dyn Predicate> {
        match self {
            PredicateKind::Balanced => Box::new(BalancedCheck),
            PredicateKind::Parent => Box::new(ParentCheck::default()),
        }
    }
}

impl SimConfig {
    /// Reads a YAML file; missing sections take their defaults.
    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            SearchError::Config(
                ErrorInfo::new("read-config", format!("failed to read config: {err}"))
                    .with_context("path", path.display()),
            )
        })?;
        serde_yaml::from_str(&contents).map_err(|err| {
            SearchError::Config(
                ErrorInfo::new("parse-config", err.to_string()).with_context("path", path.display()),
            )
        })
    }
}
