//! CLI command implementations
//!
//! Both commands work offline: `translate` never contacts an engine and
//! `query` evaluates against an in-memory one.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::SearchConfig;
use crate::observability::MetricsRegistry;
use crate::provider::{QueryOutput, QueryProvider};
use crate::query::QueryExpr;
use crate::transport::{MemoryTransport, SearchTransport};

use super::args::Command;
use super::errors::CliResult;
use super::io::{keyed_documents, read_json_file, write_json};

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let config = load_config(cli.command.config_path().map(|p| p.as_path()), std::io::stderr)?;
    init_tracing(&config.log_filter);

    let output = run_command(cli.command, &config)?;
    write_json(&output)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, config: &SearchConfig) -> CliResult<Value> {
    match cmd {
        Command::Translate { query, index, .. } => translate(&query, &index, config),
        Command::Query {
            query, data, index, ..
        } => query_documents(&query, &data, &index, config),
    }
}

/// Loads the config under a scoped subscriber at the default filter, so
/// events logged while reading it are not lost before `init_tracing`.
fn load_config<W>(path: Option<&Path>, writer: W) -> CliResult<SearchConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = log_subscriber(&SearchConfig::default().log_filter, writer);
    tracing::subscriber::with_default(bootstrap, || match path {
        Some(path) => Ok(SearchConfig::load(path)?),
        None => Ok(SearchConfig::default()),
    })
}

/// Logs go to stderr so stdout stays a single JSON value.
fn init_tracing(filter: &str) {
    let _ = tracing::subscriber::set_global_default(log_subscriber(filter, std::io::stderr));
}

/// `RUST_LOG` wins over the configured filter.
fn log_subscriber<W>(filter: &str, writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .finish()
}

fn provider_for(
    transport: Arc<dyn SearchTransport>,
    index: &str,
    config: &SearchConfig,
) -> QueryProvider<Value> {
    let index = format!("{}{}", config.index_prefix, index);
    QueryProvider::new(transport, index, Arc::new(MetricsRegistry::new()))
}

/// Compile a query chain and show the request it would send
pub fn translate(query_path: &Path, index: &str, config: &SearchConfig) -> CliResult<Value> {
    let expr: QueryExpr = read_json_file(query_path)?;
    let provider = provider_for(Arc::new(MemoryTransport::new()), index, config);

    let request = provider.request_for(&expr, None, None)?;
    Ok(json!({
        "index": request.index,
        "body": request.to_body(),
    }))
}

/// Run a query chain against documents from a file
pub fn query_documents(
    query_path: &Path,
    data_path: &Path,
    index: &str,
    config: &SearchConfig,
) -> CliResult<Value> {
    let expr: QueryExpr = read_json_file(query_path)?;
    let documents: Vec<Value> = read_json_file(data_path)?;

    let provider = {
        let target = format!("{}{}", config.index_prefix, index);
        let transport = MemoryTransport::new().with_documents(target, keyed_documents(documents)?);
        provider_for(Arc::new(transport), index, config)
    };

    Ok(match provider.execute(&expr, None)? {
        QueryOutput::Count(count) => json!({ "count": count }),
        QueryOutput::Documents(hits) => json!({ "hits": hits }),
    })
}
