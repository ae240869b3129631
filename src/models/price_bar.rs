use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One OHLCV bar for a company on one trading day. At most one exists per
/// (company, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceBar {
    pub company: String,
    #[serde(rename = "Date")]
    #[sqlx(rename = "Date")]
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// What a `?date=` parameter selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Missing or empty.
    Absent,
    On(NaiveDate),
    /// Text no stored bar can carry; selects nothing.
    Unmatched,
}

impl DateQuery {
    pub fn filter(&self) -> DateFilter {
        match self.date.as_deref() {
            None | Some("") => DateFilter::Absent,
            Some(raw) => parse_date(raw).map_or(DateFilter::Unmatched, DateFilter::On),
        }
    }
}

/// Bars are stored under their canonical `YYYY-MM-DD` text, so only that
/// exact form can name one.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .filter(|d| d.format(DATE_FORMAT).to_string() == raw)
}

// Accepts integral floats such as `1500000.0`; fractional values are rejected.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(v) = number.as_i64() {
        return Ok(Some(v));
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Some(f as i64))
        }
        _ => Err(de::Error::custom(format!("expected a whole number, got {}", number))),
    }
}

// Body of POST/PATCH /stock_data/{company}. `null` counts as not supplied,
// zero is a real value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBarRequest {
    pub date: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub volume: Option<i64>,
}

impl UpdateBarRequest {
    /// The date is `None` when it is present but cannot name a stored bar.
    pub fn into_changes(self) -> Result<(Option<NaiveDate>, BarChanges), AppError> {
        let date = match self.date.as_deref() {
            Some(d) if !d.is_empty() => parse_date(d),
            _ => return Err(AppError::Validation("Missing date parameter".to_string())),
        };

        let changes: Vec<BarChange> = [
            self.open.map(BarChange::Open),
            self.high.map(BarChange::High),
            self.low.map(BarChange::Low),
            self.close.map(BarChange::Close),
            self.volume.map(BarChange::Volume),
        ]
        .into_iter()
        .flatten()
        .collect();

        let changes = BarChanges::new(changes).ok_or_else(|| {
            AppError::Validation("At least one parameter to update must be provided".to_string())
        })?;

        Ok((date, changes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarChange {
    Open(f64),
    High(f64),
    Low(f64),
    Close(f64),
    Volume(i64),
}

impl BarChange {
    pub fn column(&self) -> &'static str {
        match self {
            BarChange::Open(_) => "open",
            BarChange::High(_) => "high",
            BarChange::Low(_) => "low",
            BarChange::Close(_) => "close",
            BarChange::Volume(_) => "volume",
        }
    }

    pub fn apply(&self, bar: &mut PriceBar) {
        match *self {
            BarChange::Open(v) => bar.open = v,
            BarChange::High(v) => bar.high = v,
            BarChange::Low(v) => bar.low = v,
            BarChange::Close(v) => bar.close = v,
            BarChange::Volume(v) => bar.volume = v,
        }
    }
}

/// A non-empty set of field changes for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChanges(Vec<BarChange>);

impl BarChanges {
    pub fn new(changes: Vec<BarChange>) -> Option<Self> {
        if changes.is_empty() {
            None
        } else {
            Some(Self(changes))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BarChange> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn apply(&self, bar: &mut PriceBar) {
        for change in &self.0 {
            change.apply(bar);
        }
    }
}
