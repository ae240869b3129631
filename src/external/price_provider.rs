use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// A daily bar as returned by a market-data provider, before it is tied to
/// a company and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no data for {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Full available history of daily bars for `company`, oldest first.
    async fn fetch_daily_history(
        &self,
        company: &str,
    ) -> Result<Vec<ExternalBar>, PriceProviderError>;
}
