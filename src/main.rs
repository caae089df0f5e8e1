//! Weight Diff Analyzer CLI
//!
//! Reads a git diff of generated runtime weight files and reports which
//! benchmark weight formulas changed beyond a threshold.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use weight_diff_analyzer::commands::{display_version, execute_analyze, AnalyzeArgs};
use weight_diff_analyzer::utils::config::{DEFAULT_THRESHOLD_PERCENT, THRESHOLD_ENV_VAR};

/// Weight Diff Analyzer - benchmark weight regression checks
#[derive(Parser, Debug)]
#[command(name = "weight-diff")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a weight diff and report flagged changes
    Analyze {
        /// Diff file to read (default: standard input)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Threshold in percent for flagging a change
        #[arg(short, long, env = THRESHOLD_ENV_VAR, default_value_t = DEFAULT_THRESHOLD_PERCENT)]
        threshold: u32,

        /// Reference-parameter table (TOML) enabling mainnet evaluation
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Write the report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            file,
            threshold,
            reference,
            output,
        } => {
            let args = AnalyzeArgs {
                input: file,
                threshold,
                reference,
                output,
            };

            execute_analyze(args)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
