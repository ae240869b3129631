use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::{error, info};

use crate::db;
use crate::errors::AppError;
use crate::models::{BarChanges, PriceBar};

pub async fn list_by_date(conn: &mut SqliteConnection, date: NaiveDate)
                          -> Result<Vec<PriceBar>, AppError> {
    db::price_bar_queries::fetch_by_date(conn, date).await
        .map_err(|e| {
            error!("Failed to fetch bars for date {}: {}", date, e);
            AppError::Db(e)
        })
}

/// All bars for `company`, or at most one when `date` is given.
pub async fn list_by_company(
    conn: &mut SqliteConnection,
    company: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<PriceBar>, AppError> {
    let result = match date {
        Some(date) => db::price_bar_queries::fetch_by_company_and_date(conn, company, date)
            .await
            .map(|bar| bar.into_iter().collect()),
        None => db::price_bar_queries::fetch_by_company(conn, company).await,
    };

    result.map_err(|e| {
        error!("Failed to fetch bars for company {}: {}", company, e);
        AppError::Db(e)
    })
}

pub async fn company_history(conn: &mut SqliteConnection, company: &str)
                             -> Result<Vec<PriceBar>, AppError> {
    db::price_bar_queries::fetch_by_company(conn, company).await
        .map_err(|e| {
            error!("Failed to fetch history for company {}: {}", company, e);
            AppError::Db(e)
        })
}

/// `date` is `None` for a date that cannot name a stored bar; like a date
/// with no bar it updates nothing.
pub async fn update_bar(
    conn: &mut SqliteConnection,
    company: &str,
    date: Option<NaiveDate>,
    changes: &BarChanges,
) -> Result<(), AppError> {
    let Some(date) = date else {
        info!("No bar for {} on an unparseable date, nothing updated", company);
        return Err(AppError::NotFound("No data found to update".to_string()));
    };

    let affected = db::price_bar_queries::update_bar(conn, company, date, changes)
        .await
        .map_err(|e| {
            error!("Failed to update bar {} {}: {}", company, date, e);
            AppError::Db(e)
        })?;

    if affected == 0 {
        info!("No bar for {} on {}, nothing updated", company, date);
        return Err(AppError::NotFound("No data found to update".to_string()));
    }

    info!("Updated {} field(s) of {} on {}", changes.len(), company, date);
    Ok(())
}
