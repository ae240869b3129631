use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::external::price_provider::{ExternalBar, PriceProvider, PriceProviderError};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; finance-data/0.1)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// Just before 1900-01-01 UTC. Earlier than any listing, so an explicit
// window from here keeps the full history at daily resolution.
const HISTORY_START: i64 = -2_208_994_789;

/// Yahoo Finance v8 chart API. No API key required.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: Url,
}

impl YahooProvider {
    pub fn new(base_url: &str) -> Result<Self, PriceProviderError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PriceProviderError::BadResponse(format!("invalid base url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PriceProviderError::BadResponse(format!("invalid base url {}", base_url)));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v8", "finance", "chart", symbol]);
        }
        url
    }

    /// Daily bars from `HISTORY_START` to `until` (unix seconds).
    fn history_request(&self, symbol: &str, until: i64) -> Result<reqwest::Request, PriceProviderError> {
        let period1 = HISTORY_START.to_string();
        let period2 = until.to_string();
        self.client
            .get(self.chart_url(symbol))
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
            ])
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

fn parse_chart(symbol: &str, body: ChartResponse) -> Result<Vec<ExternalBar>, PriceProviderError> {
    if let Some(error) = body.chart.error {
        if error.code == "Not Found" || error.description.contains("No data found") {
            return Err(PriceProviderError::NotFound(symbol.to_string()));
        }
        return Err(PriceProviderError::BadResponse(format!("{}: {}", error.code, error.description)));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| PriceProviderError::NotFound(symbol.to_string()))?;

    // A listed symbol with no trading history has no timestamp array at all.
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| PriceProviderError::BadResponse("no quote data in response".into()))?;

    if quote.close.len() != timestamps.len() {
        return Err(PriceProviderError::Parse(
            "timestamp and quote arrays have different lengths".into(),
        ));
    }

    // Dates are taken in the exchange's local time, not UTC.
    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) =
            (field(&quote.open), field(&quote.high), field(&quote.low), field(&quote.close))
        else {
            continue;
        };

        let date = chrono::DateTime::from_timestamp(ts + offset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| PriceProviderError::Parse(format!("invalid timestamp: {}", ts)))?;

        bars.push(ExternalBar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    bars.sort_by_key(|b| b.date);
    // The live session can repeat the last trading day; keep the newest row.
    bars.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            *earlier = later.clone();
            true
        } else {
            false
        }
    });

    Ok(bars)
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        company: &str,
    ) -> Result<Vec<ExternalBar>, PriceProviderError> {
        let request = self.history_request(company, chrono::Utc::now().timestamp())?;
        debug!("Fetching {}", request.url());

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(PriceProviderError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => {
                return Err(PriceProviderError::NotFound(company.to_string()))
            }
            status if !status.is_success() => {
                return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)))
            }
            _ => {}
        }

        let body: ChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        parse_chart(company, body)
    }
}
