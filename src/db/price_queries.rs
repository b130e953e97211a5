use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;
use crate::external::market_provider::ExternalPricePoint;
use crate::models::PricePoint;

pub async fn fetch_all(pool: &PgPool, ticker: &str) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(
        "SELECT id, ticker, date, close_price, created_at
         FROM price_points
         WHERE ticker = $1
         ORDER BY date ASC",
    )
    .bind(ticker)
    .fetch_all(pool)
    .await
}

pub async fn fetch_latest(pool: &PgPool, ticker: &str) -> Result<Option<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(
        "SELECT id, ticker, date, close_price, created_at
         FROM price_points
         WHERE ticker = $1
         ORDER BY date DESC
         LIMIT 1",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

/// Closes inside [start, end], oldest first.
pub async fn fetch_range(
    pool: &PgPool,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(
        "SELECT id, ticker, date, close_price, created_at
         FROM price_points
         WHERE ticker = $1 AND date >= $2 AND date <= $3
         ORDER BY date ASC",
    )
    .bind(ticker)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

pub async fn upsert_external_points(
    pool: &PgPool,
    ticker: &str,
    points: &[ExternalPricePoint],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await.map_err(|e| {
        error!("Failed to begin transaction for ticker {}: {}", ticker, e);
        e
    })?;

    for p in points {
        if let Err(e) = sqlx::query(
            "INSERT INTO price_points (id, ticker, date, close_price)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (ticker, date)
             DO UPDATE SET close_price = EXCLUDED.close_price",
        )
        .bind(Uuid::new_v4())
        .bind(ticker)
        .bind(p.date)
        .bind(p.close)
        .execute(&mut *tx)
        .await
        {
            error!(
                "Failed to upsert price for {} on {} ({}): {}",
                ticker, p.date, p.close, e
            );
            return Err(e);
        }
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit price upsert for ticker {}: {}", ticker, e);
        e
    })?;
    Ok(())
}
