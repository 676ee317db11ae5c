//! CLI argument definitions using clap
//!
//! Commands:
//! - aerosearch translate --query <file> [--config <file>] [--index <name>]
//! - aerosearch query --query <file> --data <file> [--config <file>] [--index <name>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Index used when `--index` is not given
pub const DEFAULT_INDEX: &str = "documents";

/// aerosearch - compile and run deferred search queries
#[derive(Parser, Debug)]
#[command(name = "aerosearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the engine request for a JSON-encoded query chain
    Translate {
        /// Path to the query chain (JSON)
        #[arg(long)]
        query: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target index, before the configured prefix
        #[arg(long, default_value = DEFAULT_INDEX)]
        index: String,
    },

    /// Run a query chain against documents loaded from a file
    Query {
        /// Path to the query chain (JSON)
        #[arg(long)]
        query: PathBuf,

        /// Path to a JSON array of documents
        #[arg(long)]
        data: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target index, before the configured prefix
        #[arg(long, default_value = DEFAULT_INDEX)]
        index: String,
    },
}

impl Command {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Translate { config, .. } | Command::Query { config, .. } => config.as_ref(),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
