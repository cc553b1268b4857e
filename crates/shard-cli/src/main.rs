use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    merge::{self, MergeArgs},
    plan::{self, PlanArgs},
    verify::{self, VerifyArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "shard-merge",
    about = "Consolidate per-run detector shards into one globally indexed event store"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge every shard in a directory into the merged store.
    Merge(MergeArgs),
    /// Show the seed and shard order a merge would use, without side effects.
    Plan(PlanArgs),
    /// Check header labels, trace pairs and the high-water mark of a merged store.
    Verify(VerifyArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Command::Merge(args) => merge::run(&args),
        Command::Plan(args) => plan::run(&args),
        Command::Verify(args) => verify::run(&args),
    }
}
