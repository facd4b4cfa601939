//! # CLI Interface
//!
//! Defines the command-line argument structure for `flash-cli` using
//! `clap` derive. Supports three subcommands: `simulate`, `init`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Flash channel simulator.
///
/// Opens an N-party Flash channel in one process, runs the scripted
/// transfers through build, sign, merge and apply for every participant,
/// optionally closes the channel, and prints the bundles and final state as
/// JSON on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "flash-cli",
    about = "Flash payment channel simulator",
    version,
    propagate_version = true
)]
pub struct FlashCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the simulator binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario file and print the resulting bundles and state.
    Simulate(SimulateArgs),
    /// Write a sample two-party scenario file.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Path to the scenario file (JSON).
    #[arg(env = "FLASH_SCENARIO")]
    pub scenario: PathBuf,

    /// Close the channel after the scripted rounds, even if the scenario
    /// does not ask for it.
    #[arg(long)]
    pub close: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "FLASH_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, default_value = "flash_cli=info,flash_channel=info")]
    pub log_level: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the scenario file.
    #[arg(long, short = 'o', default_value = "scenario.json")]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}
