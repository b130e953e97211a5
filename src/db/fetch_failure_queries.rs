use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use crate::models::FetchFailure;
use crate::services::failure_cache::FailureType;

/// A ticker may be fetched again once no unexpired failure row exists.
pub async fn should_retry_ticker(pool: &PgPool, ticker: &str) -> Result<bool, sqlx::Error> {
    let active: Option<(DateTime<Utc>,)> = sqlx::query_as(
        "SELECT retry_after
         FROM ticker_fetch_failures
         WHERE ticker = $1 AND retry_after > NOW()",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await?;
    Ok(active.is_none())
}

pub async fn get_active_failure(
    pool: &PgPool,
    ticker: &str,
) -> Result<Option<FetchFailure>, sqlx::Error> {
    sqlx::query_as::<_, FetchFailure>(
        "SELECT ticker, failure_type, error_message, failed_at, retry_after
         FROM ticker_fetch_failures
         WHERE ticker = $1 AND retry_after > NOW()",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

pub async fn record_fetch_failure(
    pool: &PgPool,
    ticker: &str,
    failure_type: FailureType,
    error_message: Option<&str>,
) -> Result<(), sqlx::Error> {
    let retry_after = Utc::now() + Duration::hours(failure_type.ttl_hours());
    sqlx::query(
        "INSERT INTO ticker_fetch_failures (ticker, failure_type, error_message, failed_at, retry_after)
         VALUES ($1, $2, $3, NOW(), $4)
         ON CONFLICT (ticker)
         DO UPDATE SET failure_type = EXCLUDED.failure_type,
                       error_message = EXCLUDED.error_message,
                       failed_at = EXCLUDED.failed_at,
                       retry_after = EXCLUDED.retry_after",
    )
    .bind(ticker)
    .bind(failure_type.as_str())
    .bind(error_message)
    .bind(retry_after)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn clear_fetch_failure(pool: &PgPool, ticker: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM ticker_fetch_failures WHERE ticker = $1")
        .bind(ticker)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ticker_fetch_failures WHERE retry_after <= NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
