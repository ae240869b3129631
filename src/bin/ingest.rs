use std::path::PathBuf;

use anyhow::Context;
use finance_data::config::{IngestConfig, DEFAULT_CONFIG_FILE};
use finance_data::db;
use finance_data::external::yahoo::YahooProvider;
use finance_data::jobs::ingest_job;
use finance_data::logging::{self, LoggingConfig};

/// Usage: `ingest [CONFIG_FILE]`. The INI file (default `config.ini`) lists
/// `companies = A,B,...` under `[DEFAULT]`; a `COMPANIES` environment
/// variable replaces that list.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    logging::init_logging(LoggingConfig::from_env("finance-data-ingest"))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = IngestConfig::load(&config_path)?;
    tracing::info!("Ingesting {} companies: {}", config.companies.len(), config.companies.join(","));

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    let provider = YahooProvider::new(&config.yahoo_base_url)?;

    let result = ingest_job::run(&pool, &provider, &config.companies).await;
    pool.close().await;
    result?;

    Ok(())
}
