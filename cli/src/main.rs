// Copyright (c) 2026 Flash Channel Contributors. MIT License.
// See LICENSE for details.

//! # Flash Channel Simulator
//!
//! Entry point for the `flash-cli` binary. Parses CLI arguments, initializes
//! logging, and runs a channel scenario end to end in one process.
//!
//! The binary supports three subcommands:
//!
//! - `simulate` - run a scenario file, print bundles and final state as JSON
//! - `init`     - write a sample scenario file
//! - `version`  - print build version information

mod cli;
mod logging;
mod scenario;

use anyhow::{bail, Context, Result};
use clap::Parser;

use cli::{Commands, FlashCli};
use logging::LogFormat;
use scenario::Scenario;

fn main() -> Result<()> {
    let cli = FlashCli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate(args),
        Commands::Init(args) => init_scenario(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads a scenario, plays it, and prints the report to stdout.
fn simulate(args: cli::SimulateArgs) -> Result<()> {
    logging::init_logging(&args.log_level, LogFormat::from_str_lossy(&args.log_format));

    let scenario = Scenario::load(&args.scenario)?;
    tracing::info!(
        scenario = %args.scenario.display(),
        signers = scenario.channel.signers_count,
        rounds = scenario.rounds.len(),
        "running scenario"
    );

    let report = scenario::run(&scenario, args.close)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to encode report")?;
    println!("{}", json);
    Ok(())
}

/// Writes the sample scenario.
fn init_scenario(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("flash_cli=info", LogFormat::Pretty);

    let path = &args.output;
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let json = serde_json::to_string_pretty(&Scenario::sample())
        .context("failed to encode sample scenario")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write scenario to {}", path.display()))?;

    tracing::info!(path = %path.display(), "sample scenario written");
    println!("Scenario written to {}", path.display());
    println!("Run it with: flash-cli simulate {}", path.display());
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("flash-cli {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", flash_channel::config::PROTOCOL_VERSION);
}
