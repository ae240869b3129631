use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::error;

use crate::external::price_provider::ExternalBar;
use crate::models::{BarChange, BarChanges, PriceBar};

// Seven bound parameters per row; keeps each statement well under SQLite's
// host-parameter limit.
const UPSERT_CHUNK_ROWS: usize = 1000;

/// Inserts `bars` for `company`, overwriting every field of rows that
/// already exist for the same (company, date). Returns rows written.
pub async fn upsert_bars(
    conn: &mut SqliteConnection,
    company: &str,
    bars: &[ExternalBar],
) -> Result<u64, sqlx::Error> {
    let mut written = 0;

    for chunk in bars.chunks(UPSERT_CHUNK_ROWS) {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO finance_data (company, Date, open, high, low, close, volume) ",
        );

        query_builder.push_values(chunk, |mut row, bar| {
            row.push_bind(company)
                .push_bind(bar.date)
                .push_bind(bar.open)
                .push_bind(bar.high)
                .push_bind(bar.low)
                .push_bind(bar.close)
                .push_bind(bar.volume);
        });

        query_builder.push(
            " ON CONFLICT (company, Date) DO UPDATE SET \
             open = excluded.open, high = excluded.high, low = excluded.low, \
             close = excluded.close, volume = excluded.volume",
        );

        let result = query_builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("Failed to upsert {} bars for company {}: {}", chunk.len(), company, e);
                e
            })?;
        written += result.rows_affected();
    }

    Ok(written)
}

pub async fn fetch_by_date(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Vec<PriceBar>, sqlx::Error> {
    sqlx::query_as::<_, PriceBar>(
        r#"
        SELECT company, Date, open, high, low, close, volume
        FROM finance_data
        WHERE Date = ?
        ORDER BY company
        "#,
    )
    .bind(date)
    .fetch_all(conn)
    .await
}

pub async fn fetch_by_company(
    conn: &mut SqliteConnection,
    company: &str,
) -> Result<Vec<PriceBar>, sqlx::Error> {
    sqlx::query_as::<_, PriceBar>(
        r#"
        SELECT company, Date, open, high, low, close, volume
        FROM finance_data
        WHERE company = ?
        ORDER BY Date
        "#,
    )
    .bind(company)
    .fetch_all(conn)
    .await
}

pub async fn fetch_by_company_and_date(
    conn: &mut SqliteConnection,
    company: &str,
    date: NaiveDate,
) -> Result<Option<PriceBar>, sqlx::Error> {
    sqlx::query_as::<_, PriceBar>(
        r#"
        SELECT company, Date, open, high, low, close, volume
        FROM finance_data
        WHERE company = ? AND Date = ?
        "#,
    )
    .bind(company)
    .bind(date)
    .fetch_optional(conn)
    .await
}

/// Overwrites only the columns named in `changes`. Returns rows affected,
/// which is 0 when no bar exists for (company, date).
pub async fn update_bar(
    conn: &mut SqliteConnection,
    company: &str,
    date: NaiveDate,
    changes: &BarChanges,
) -> Result<u64, sqlx::Error> {
    let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE finance_data SET ");

    let mut separated = query_builder.separated(", ");
    for change in changes.iter() {
        separated.push(format!("{} = ", change.column()));
        match *change {
            BarChange::Open(v) | BarChange::High(v) | BarChange::Low(v) | BarChange::Close(v) => {
                separated.push_bind_unseparated(v);
            }
            BarChange::Volume(v) => {
                separated.push_bind_unseparated(v);
            }
        }
    }

    query_builder.push(" WHERE company = ");
    query_builder.push_bind(company);
    query_builder.push(" AND Date = ");
    query_builder.push_bind(date);

    let result = query_builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn count_bars(conn: &mut SqliteConnection, company: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM finance_data WHERE company = ?")
        .bind(company)
        .fetch_one(conn)
        .await
}
