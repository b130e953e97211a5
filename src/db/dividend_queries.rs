use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;
use crate::external::market_provider::ExternalDividend;
use crate::models::DividendEvent;

pub async fn fetch_all(pool: &PgPool, ticker: &str) -> Result<Vec<DividendEvent>, sqlx::Error> {
    sqlx::query_as::<_, DividendEvent>(
        "SELECT id, ticker, ex_date, amount_per_share, currency, created_at
         FROM dividend_events
         WHERE ticker = $1
         ORDER BY ex_date ASC",
    )
    .bind(ticker)
    .fetch_all(pool)
    .await
}

pub async fn fetch_latest(
    pool: &PgPool,
    ticker: &str,
) -> Result<Option<DividendEvent>, sqlx::Error> {
    sqlx::query_as::<_, DividendEvent>(
        "SELECT id, ticker, ex_date, amount_per_share, currency, created_at
         FROM dividend_events
         WHERE ticker = $1
         ORDER BY ex_date DESC
         LIMIT 1",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

/// Distributions with ex-date inside [start, end), oldest first. The end
/// bound is exclusive to match the simulation window.
pub async fn fetch_range(
    pool: &PgPool,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DividendEvent>, sqlx::Error> {
    sqlx::query_as::<_, DividendEvent>(
        "SELECT id, ticker, ex_date, amount_per_share, currency, created_at
         FROM dividend_events
         WHERE ticker = $1 AND ex_date >= $2 AND ex_date < $3
         ORDER BY ex_date ASC",
    )
    .bind(ticker)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

pub async fn upsert_external_events(
    pool: &PgPool,
    ticker: &str,
    events: &[ExternalDividend],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await.map_err(|e| {
        error!("Failed to begin transaction for ticker {}: {}", ticker, e);
        e
    })?;

    for ev in events {
        if let Err(e) = sqlx::query(
            "INSERT INTO dividend_events (id, ticker, ex_date, amount_per_share, currency)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (ticker, ex_date)
             DO UPDATE SET amount_per_share = EXCLUDED.amount_per_share,
                           currency = EXCLUDED.currency",
        )
        .bind(Uuid::new_v4())
        .bind(ticker)
        .bind(ev.ex_date)
        .bind(ev.amount)
        .bind(ev.currency.clone().unwrap_or_else(|| "USD".to_string()))
        .execute(&mut *tx)
        .await
        {
            error!(
                "Failed to upsert dividend for {} on {} ({}): {}",
                ticker, ev.ex_date, ev.amount, e
            );
            return Err(e);
        }
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit dividend upsert for ticker {}: {}", ticker, e);
        e
    })?;
    Ok(())
}
