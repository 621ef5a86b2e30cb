use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::Args;
use ghd_bus::InMemoryBus;
use ghd_core::errors::{ErrorInfo, SearchError};
use ghd_dist::{DistributedSearch, Worker};
use ghd_graph::{canonical_hash, get_subset, graph_from_json, Graph};
use ghd_search::{CombinationIterator, Registries};
use serde::Serialize;
use tracing::info;

use crate::config::{PredicateKind, SimConfig};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// JSON hypergraph to search.
    #[arg(long)]
    pub graph: PathBuf,
    /// Optional YAML configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of edges per separator.
    #[arg(long)]
    pub k: Option<usize>,
    /// Balance factor handed to the predicate.
    #[arg(long)]
    pub balance_factor: Option<usize>,
    /// Acceptance test.
    #[arg(long, value_enum)]
    pub predicate: Option<PredicateKind>,
    /// Keep searching after the first separator and report all of them.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct SearchReport {
    graph_hash: String,
    k: usize,
    balance_factor: usize,
    predicate: PredicateKind,
    rounds: u64,
    dispatches: u64,
    exhausted: bool,
    selection: Vec<usize>,
    separator: Vec<u32>,
    separators: Vec<Vec<u32>>,
}

pub fn run(args: &SearchArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let graph = load_graph(&args.graph)?;
    let report = execute(&apply_overrides(config, args), graph, args.all)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn apply_overrides(mut config: SimConfig, args: &SearchArgs) -> SimConfig {
    if let Some(k) = args.k {
        config.search.k = k;
    }
    if let Some(balance_factor) = args.balance_factor {
        config.search.balance_factor = balance_factor;
    }
    if let Some(predicate) = args.predicate {
        config.search.predicate = predicate;
    }
    config
}

fn load_graph(path: &Path) -> Result<Graph, SearchError> {
    let json = fs::read_to_string(path).map_err(|err| {
        SearchError::Config(
            ErrorInfo::new("read-graph", format!("failed to read graph: {err}"))
                .with_context("path", path.display()),
        )
    })?;
    graph_from_json(&json).map_err(|err| err.with_context("path", path.display()))
}

fn execute(config: &SimConfig, graph: Graph, all: bool) -> Result<SearchReport, SearchError> {
    let registries = Registries::standard()?;
    let bus = InMemoryBus::new(config.bus.clone());

    let stop = Arc::new(AtomicBool::new(false));
    let worker = Worker::new(bus.clone(), registries.clone(), config.dispatch.clone());
    let handle = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || worker.serve(&stop))
    };

    let outcome = coordinate(&bus, registries, config, graph, all);
    stop.store(true, Ordering::Release);
    let served = handle.join().map_err(|_| {
        SearchError::Transport(ErrorInfo::new("worker-panicked", "worker thread panicked"))
    })??;
    info!(
        handled = served.handled,
        acknowledged = served.acknowledged,
        "worker finished"
    );
    outcome
}

fn coordinate(
    bus: &InMemoryBus,
    registries: Registries,
    config: &SimConfig,
    graph: Graph,
    all: bool,
) -> Result<SearchReport, SearchError> {
    let settings = &config.search;
    let edges = graph.edges.clone();
    let graph_hash = canonical_hash(&graph);
    let predicate = settings.predicate.build();
    let mut search = DistributedSearch::new(
        bus.clone(),
        registries,
        config.dispatch.clone(),
        graph,
        edges.clone(),
        settings.balance_factor,
        Box::new(CombinationIterator::new(edges.len(), settings.k)),
    )?;

    let mut selection = Vec::new();
    let mut separators = Vec::new();
    loop {
        search.advance(predicate.as_ref())?;
        if search.is_exhausted() {
            break;
        }
        selection = search.current_result().to_vec();
        separators.push(get_subset(&edges, &selection)?.names());
        if !all {
            break;
        }
    }

    let separator = separators.first().cloned().unwrap_or_default();
    Ok(SearchReport {
        graph_hash,
        k: settings.k,
        balance_factor: settings.balance_factor,
        predicate: settings.predicate,
        rounds: search.rounds(),
        dispatches: search.dispatches(),
        exhausted: search.is_exhausted(),
        selection,
        separator,
        separators,
    })
}
