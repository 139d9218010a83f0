//! Main application entry point (binary).
//!
//! This is a thin wrapper around the `dns_logstore` library that handles:
//! - Configuration from environment variables
//! - Logger initialization
//! - Loading stdin as one batch
//! - User-facing output
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use std::process;

use dns_logstore::ingest::load;
use dns_logstore::initialization::init_logger_with;
use dns_logstore::{connect_with_policy, Config, LogStore, LogTable};
use tokio::io::{stdin, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;

    init_logger_with(config.log_level.into(), config.log_format)
        .context("Failed to initialize logger")?;

    if let Err(e) = run(config).await {
        eprintln!("dns_logstore error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let store = connect_with_policy(&config.connection, config.retry)
        .await
        .context("Failed to connect to database")?;

    let outcome = load_and_report(&store, &config).await;
    store.close().await;
    outcome
}

async fn load_and_report(store: &LogStore, config: &Config) -> Result<()> {
    let summary = load(store, BufReader::new(stdin()), config)
        .await
        .with_context(|| format!("Failed to load {} records", config.table))?;

    if summary.table == LogTable::Dns {
        for domain in store
            .top_five_domains()
            .await
            .context("Failed to query top domains")?
        {
            println!("{}", serde_json::to_string(&domain)?);
        }
    }
    Ok(())
}
