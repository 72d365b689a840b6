//! # Custody Node
//!
//! Entry point: `custody-node < requests.jsonl > responses.jsonl`.

use anyhow::{Context, Result};
use custody_node::{NodeConfig, NodeRuntime};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("invalid configuration")?;

    // Logs go to stderr; stdout carries responses only.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        data_file = %config.data_file.display(),
        retries = config.max_conflict_retries,
        "[custody] Starting custody node"
    );

    let runtime = NodeRuntime::open(&config)?;
    runtime
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("[custody] Shutdown complete");
    Ok(())
}
