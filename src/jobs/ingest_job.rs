//! Bulk load of daily price history.
//!
//! For every configured company the full history is pulled from the
//! provider and upserted keyed on (company, date). All writes of a run share
//! one transaction that is committed only after the last company, so a
//! failure anywhere leaves the table exactly as it was before the run.
//!
//! There is no retry and no per-company isolation: the first provider or
//! database error aborts the run.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db;
use crate::external::price_provider::{PriceProvider, PriceProviderError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to fetch history for {company}: {source}")]
    Provider {
        company: String,
        #[source]
        source: PriceProviderError,
    },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub companies_processed: usize,
    pub bars_upserted: u64,
}

pub async fn run(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    companies: &[String],
) -> Result<IngestReport, IngestError> {
    {
        let mut conn = pool.acquire().await?;
        db::create_schema(&mut conn).await?;
    }

    let mut tx = pool.begin().await?;
    let mut report = IngestReport::default();

    for company in companies {
        info!("Fetching daily history for {}", company);
        let bars = provider.fetch_daily_history(company).await.map_err(|e| {
            error!("Failed to fetch history for {}: {}", company, e);
            IngestError::Provider { company: company.clone(), source: e }
        })?;

        if bars.is_empty() {
            warn!("Provider returned no bars for {}", company);
        }

        let written = db::price_bar_queries::upsert_bars(&mut tx, company, &bars).await?;
        info!("Upserted {} bars for {}", written, company);

        report.companies_processed += 1;
        report.bars_upserted += written;
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit ingest run: {}", e);
        IngestError::Db(e)
    })?;

    info!(
        "Ingest complete: {} companies, {} bars upserted",
        report.companies_processed, report.bars_upserted
    );
    Ok(report)
}
