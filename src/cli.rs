//! Command-line interface for pipeflow.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pipeflow - connect the pipes before the water runs out
#[derive(Parser, Debug)]
#[command(name = "pipeflow")]
#[command(about = "Pipe-network water puzzle for the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the level catalog
    Levels {
        /// Path to a TOML game configuration (defaults to the built-in catalog)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Play in the terminal
    Play {
        /// Level number to start on
        #[arg(short, long, default_value = "1")]
        level: usize,

        /// RNG seed for reproducible grids
        #[arg(short, long)]
        seed: Option<u64>,

        /// Path to a TOML game configuration (defaults to the built-in catalog)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
