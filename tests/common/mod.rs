#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use finance_data::app::create_app;
use finance_data::db;
use finance_data::external::price_provider::{ExternalBar, PriceProvider, PriceProviderError};
use finance_data::state::AppState;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    let mut conn = pool.acquire().await.expect("connection");
    db::create_schema(&mut conn).await.expect("schema");
    pool
}

pub async fn test_app() -> (Router, SqlitePool) {
    let pool = test_pool().await;
    (create_app(AppState { pool: pool.clone() }), pool)
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn bar(day: &str, close: f64) -> ExternalBar {
    ExternalBar {
        date: date(day),
        open: close - 1.0,
        high: close + 2.0,
        low: close - 3.0,
        close,
        volume: 10_000,
    }
}

pub async fn seed(pool: &SqlitePool, company: &str, bars: &[ExternalBar]) {
    let mut conn = pool.acquire().await.unwrap();
    db::price_bar_queries::upsert_bars(&mut conn, company, bars).await.unwrap();
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub enum Scripted {
    Bars(Vec<ExternalBar>),
    RateLimited,
    NotFound,
}

/// Provider that answers from a fixed script and records what was asked.
#[derive(Default)]
pub struct FakeProvider {
    script: HashMap<String, Scripted>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn with(mut self, company: &str, answer: Scripted) -> Self {
        self.script.insert(company.to_string(), answer);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceProvider for FakeProvider {
    async fn fetch_daily_history(
        &self,
        company: &str,
    ) -> Result<Vec<ExternalBar>, PriceProviderError> {
        self.calls.lock().unwrap().push(company.to_string());
        match self.script.get(company) {
            Some(Scripted::Bars(bars)) => Ok(bars.clone()),
            Some(Scripted::RateLimited) => Err(PriceProviderError::RateLimited),
            Some(Scripted::NotFound) | None => Err(PriceProviderError::NotFound(company.to_string())),
        }
    }
}
