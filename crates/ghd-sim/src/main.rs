use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    random_graph::{self, RandomGraphArgs},
    search::{self, SearchArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "ghd-sim", about = "Distributed separator search over an in-memory bus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search a hypergraph for a balanced separator through a worker thread.
    Search(SearchArgs),
    /// Write a seeded random hypergraph as JSON.
    RandomGraph(RandomGraphArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Search(args) => search::run(&args),
        Command::RandomGraph(args) => random_graph::run(&args),
    }
}
