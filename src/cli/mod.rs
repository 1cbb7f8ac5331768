//! Command line interface for querycache.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// querycache - answer client finance questions through an LRU cache.
#[derive(Parser, Debug)]
#[command(name = "querycache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "querycache.toml")]
    pub config: PathBuf,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Writes a default configuration and sample dataset.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Answers a single query.
    Ask {
        /// The query, e.g. "account balance of John in 2023".
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Reads queries from stdin until `exit` or end of input.
    Repl,

    /// Walks through LRU eviction on a capacity-4 cache.
    Demo,

    /// Checks configuration and dataset.
    Doctor,

    /// Shows version.
    Version,
}
