//! mlforge CLI - register datasets, materialize train/eval splits and run
//! training jobs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::{dataset, project, runs, train};

/// Route `log` records from the library crates to stderr. `RUST_LOG`
/// overrides the level picked from `--verbose`.
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;

    // Built without tracing-subscriber's own log bridge.
    tracing_log::LogTracer::init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose)?;

    match &cli.command {
        cli::Commands::Project(args) => project::execute(args, &cli.global).await,
        cli::Commands::Dataset(args) => dataset::execute(args, &cli.global).await,
        cli::Commands::Train(args) => train::execute(args, &cli.global).await,
        cli::Commands::Runs(args) => runs::execute(args, &cli.global).await,
    }
}
