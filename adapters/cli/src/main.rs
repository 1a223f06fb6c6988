#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Pirate Defence session.

mod runner;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::session::Settings;

/// Runs a headless Pirate Defence session and prints its outcome.
#[derive(Parser, Debug)]
#[command(name = "pirate-defence")]
#[command(about = "Runs a headless Pirate Defence session")]
pub(crate) struct Args {
    /// TOML session file; flags given here override its values.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed of the wave slot shuffle.
    #[arg(long)]
    seed: Option<u64>,

    /// Re-aim cannonballs at their target every frame.
    #[arg(long)]
    tracking: bool,

    /// Simulated milliseconds per frame.
    #[arg(long, value_name = "MS")]
    frame_ms: Option<u64>,

    /// Stop after this many simulated seconds.
    #[arg(long, value_name = "SECONDS")]
    max_seconds: Option<u64>,

    /// Tile to build a tower on; repeat to queue several.
    #[arg(long = "build", value_name = "COLUMN,ROW")]
    build: Vec<String>,
}

/// Entry point for the Pirate Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::resolve(&args)?;
    let report = runner::run(&settings)?;
    println!("{report}");
    Ok(())
}
