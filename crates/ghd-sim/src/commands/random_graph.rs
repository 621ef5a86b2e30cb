use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use ghd_graph::{canonical_hash, graph_to_json, random_graph, RandomGraphConfig};
use serde_json::json;

#[derive(Args, Debug)]
pub struct RandomGraphArgs {
    /// Number of hyperedges.
    #[arg(long, default_value_t = 10)]
    pub edges: usize,
    /// Size of the vertex pool.
    #[arg(long, default_value_t = 12)]
    pub vertices: usize,
    /// Maximum vertices per edge.
    #[arg(long, default_value_t = 3)]
    pub max_arity: usize,
    /// Seed for deterministic generation.
    #[arg(long, default_value_t = 2024)]
    pub seed: u64,
    /// Output JSON path.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &RandomGraphArgs) -> Result<(), Box<dyn Error>> {
    let config = RandomGraphConfig {
        edges: args.edges,
        vertices: args.vertices,
        max_arity: args.max_arity,
    };
    let graph = random_graph(&config, args.seed)?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.out, graph_to_json(&graph)?)?;

    let summary = json!({
        "out": args.out.display().to_string(),
        "seed": args.seed,
        "edges": graph.edges.len(),
        "vertices": graph.vertices().len(),
        "hash": canonical_hash(&graph),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
