//! CLI module for aerosearch
//!
//! Provides command-line interface for:
//! - translate: show the engine request for a query chain
//! - query: run a query chain against documents from a file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, DEFAULT_INDEX};
pub use commands::{query_documents, run, run_command, translate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{keyed_documents, read_json_file, write_json};
