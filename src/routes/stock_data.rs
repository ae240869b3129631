use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::models::{DateFilter, DateQuery, PriceBar, UpdateBarRequest};
use crate::services::price_service;
use crate::state::{AppState, DbConn};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock_data", get(get_stock_data_by_date))
        .route(
            "/stock_data/:company",
            get(get_company_stock_data)
                .post(update_company_stock_data)
                .patch(update_company_stock_data),
        )
        .route("/company_stock_data/:company", get(get_company_history))
}

pub async fn get_stock_data_by_date(
    Query(query): Query<DateQuery>,
    mut conn: DbConn,
) -> Result<Json<Vec<PriceBar>>, AppError> {
    let date = match query.filter() {
        DateFilter::Absent => {
            return Err(AppError::Validation("Missing date parameter".to_string()))
        }
        DateFilter::Unmatched => {
            info!("GET /stock_data?date={:?} - No bar can match", query.date);
            return Ok(Json(Vec::new()));
        }
        DateFilter::On(date) => date,
    };
    info!("GET /stock_data?date={} - Listing bars for date", date);

    let bars = price_service::list_by_date(&mut conn, date).await?;
    Ok(Json(bars))
}

/// Backend failures on this route are reported with their message.
pub async fn get_company_stock_data(
    Path(company): Path<String>,
    Query(query): Query<DateQuery>,
    conn: Result<DbConn, AppError>,
) -> Result<Json<Vec<PriceBar>>, AppError> {
    let date = match query.filter() {
        DateFilter::Absent => None,
        DateFilter::Unmatched => {
            info!("GET /stock_data/{}?date={:?} - No bar can match", company, query.date);
            return Ok(Json(Vec::new()));
        }
        DateFilter::On(date) => Some(date),
    };
    info!("GET /stock_data/{} (date: {:?}) - Listing bars for company", company, date);

    let mut conn = conn.map_err(AppError::exposed)?;
    let bars = price_service::list_by_company(&mut conn, &company, date)
        .await
        .map_err(AppError::exposed)?;
    Ok(Json(bars))
}

pub async fn update_company_stock_data(
    Path(company): Path<String>,
    mut conn: DbConn,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request = parse_update_body(&body)?;
    let (date, changes) = request.into_changes()?;
    info!("UPDATE /stock_data/{} - {} field(s) on {:?}", company, changes.len(), date);

    price_service::update_bar(&mut conn, &company, date, &changes).await?;
    Ok(Json(json!({ "message": "Data updated successfully" })))
}

pub async fn get_company_history(
    Path(company): Path<String>,
    mut conn: DbConn,
) -> Result<Json<Vec<PriceBar>>, AppError> {
    info!("GET /company_stock_data/{} - Full history", company);
    let bars = price_service::company_history(&mut conn, &company).await?;
    Ok(Json(bars))
}

// The body is read raw so that an absent body, `null` and `{}` all get the
// same 400 instead of an extractor rejection.
fn parse_update_body(body: &[u8]) -> Result<UpdateBarRequest, AppError> {
    let missing = || AppError::Validation("Missing request body".to_string());

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(missing());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?;

    match &value {
        Value::Null => return Err(missing()),
        Value::Object(map) if map.is_empty() => return Err(missing()),
        Value::Object(_) => {}
        _ => return Err(AppError::Validation("Request body must be a JSON object".to_string())),
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_blank_bodies_are_missing() {
        let bodies: [&[u8]; 4] = [b"", b"   ", b"null", b"{}"];
        for body in bodies {
            let err = parse_update_body(body).unwrap_err();
            assert_eq!(err.to_string(), "Missing request body");
        }
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(matches!(parse_update_body(b"[1, 2]"), Err(AppError::Validation(_))));
        assert!(matches!(parse_update_body(b"{not json"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_wrongly_typed_field_rejected() {
        let err = parse_update_body(br#"{"date": "2024-01-02", "close": "high"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"));
    }

    #[test]
    fn test_valid_body_parses() {
        let req = parse_update_body(br#"{"date": "2024-01-02", "close": 101.5}"#).unwrap();
        assert_eq!(req.date.as_deref(), Some("2024-01-02"));
        assert_eq!(req.close, Some(101.5));
        assert_eq!(req.open, None);
    }

    #[test]
    fn test_float_volume_body_parses() {
        let req = parse_update_body(br#"{"date": "2024-01-02", "volume": 1500000.0}"#).unwrap();
        assert_eq!(req.volume, Some(1_500_000));
    }
}
