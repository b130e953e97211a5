use sqlx::PgPool;
use crate::models::{DripSnapshot, RankingEntry};

pub async fn fetch_fresh(
    pool: &PgPool,
    ticker: &str,
    window_days: i32,
) -> Result<Option<DripSnapshot>, sqlx::Error> {
    sqlx::query_as::<_, DripSnapshot>(
        "SELECT id, ticker, window_days, as_of, start_date, end_date,
                start_price, end_price, end_shares, total_dividends,
                growth_percent, dividends_reinvested, dividends_skipped,
                computed_at, expires_at
         FROM drip_snapshots
         WHERE ticker = $1 AND window_days = $2 AND expires_at > NOW()",
    )
    .bind(ticker)
    .bind(window_days)
    .fetch_optional(pool)
    .await
}

pub async fn upsert_snapshot(pool: &PgPool, snapshot: &DripSnapshot) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO drip_snapshots
             (id, ticker, window_days, as_of, start_date, end_date,
              start_price, end_price, end_shares, total_dividends,
              growth_percent, dividends_reinvested, dividends_skipped,
              computed_at, expires_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         ON CONFLICT (ticker, window_days)
         DO UPDATE SET as_of = EXCLUDED.as_of,
                       start_date = EXCLUDED.start_date,
                       end_date = EXCLUDED.end_date,
                       start_price = EXCLUDED.start_price,
                       end_price = EXCLUDED.end_price,
                       end_shares = EXCLUDED.end_shares,
                       total_dividends = EXCLUDED.total_dividends,
                       growth_percent = EXCLUDED.growth_percent,
                       dividends_reinvested = EXCLUDED.dividends_reinvested,
                       dividends_skipped = EXCLUDED.dividends_skipped,
                       computed_at = EXCLUDED.computed_at,
                       expires_at = EXCLUDED.expires_at",
    )
    .bind(snapshot.id)
    .bind(&snapshot.ticker)
    .bind(snapshot.window_days)
    .bind(snapshot.as_of)
    .bind(snapshot.start_date)
    .bind(snapshot.end_date)
    .bind(snapshot.start_price)
    .bind(snapshot.end_price)
    .bind(snapshot.end_shares)
    .bind(snapshot.total_dividends)
    .bind(snapshot.growth_percent)
    .bind(snapshot.dividends_reinvested)
    .bind(snapshot.dividends_skipped)
    .bind(snapshot.computed_at)
    .bind(snapshot.expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Force-expire every cached window for a ticker. Returns rows touched.
pub async fn invalidate_ticker(pool: &PgPool, ticker: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE drip_snapshots
         SET expires_at = NOW()
         WHERE ticker = $1 AND expires_at > NOW()",
    )
    .bind(ticker)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM drip_snapshots WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Active ETFs with a fresh snapshot for the window, best growth first.
pub async fn fetch_ranked(
    pool: &PgPool,
    window_days: i32,
) -> Result<Vec<RankingEntry>, sqlx::Error> {
    sqlx::query_as::<_, RankingEntry>(
        "SELECT d.ticker, e.name, d.window_days, d.growth_percent,
                d.total_dividends, d.end_shares, d.as_of, d.computed_at
         FROM drip_snapshots d
         JOIN etfs e ON e.ticker = d.ticker
         WHERE d.window_days = $1 AND e.active AND d.expires_at > NOW()
         ORDER BY d.growth_percent DESC",
    )
    .bind(window_days)
    .fetch_all(pool)
    .await
}

/// (total, fresh, stale, degraded, avg_age_hours) over the snapshot table.
/// Degraded entries are those computed with at least one skipped dividend.
pub async fn cache_stats(
    pool: &PgPool,
) -> Result<(i64, i64, i64, i64, Option<f64>), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64, i64, i64, Option<f64>)>(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE expires_at > NOW()) AS fresh,
                COUNT(*) FILTER (WHERE expires_at <= NOW()) AS stale,
                COUNT(*) FILTER (WHERE dividends_skipped > 0) AS degraded,
                AVG(EXTRACT(EPOCH FROM (NOW() - computed_at)) / 3600.0)::float8 AS avg_age_hours
         FROM drip_snapshots",
    )
    .fetch_one(pool)
    .await
}
