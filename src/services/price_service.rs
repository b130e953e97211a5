use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tokio::time::{sleep as async_sleep, Duration};
use tracing::{error, info, warn};

use crate::db;
use crate::errors::AppError;
use crate::external::market_provider::{
    ExternalPricePoint, MarketDataError, MarketDataProvider,
};
use crate::models::PricePoint;
use crate::services::failure_cache::{FailureCache, FailureType};
use crate::services::rate_limiter::RateLimiter;

// Covers the longest ranking window (364 days) with lead time for the first
// reinvestment price.
pub const HISTORY_DAYS: u32 = 400;

pub async fn get_history(pool: &PgPool, ticker: &str) -> Result<Vec<PricePoint>, AppError> {
    db::price_queries::fetch_all(pool, ticker).await.map_err(|e| {
        error!("Failed to fetch price history for ticker {}: {}", ticker, e);
        AppError::Db(e)
    })
}

pub async fn get_latest(pool: &PgPool, ticker: &str) -> Result<PricePoint, AppError> {
    db::price_queries::fetch_latest(pool, ticker)
        .await
        .map_err(|e| {
            error!("Failed to fetch latest price for ticker {}: {}", ticker, e);
            AppError::Db(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("No price data found for ticker {}", ticker)))
}

/// Classify a provider error for the negative caches.
pub fn classify_failure(e: &MarketDataError) -> FailureType {
    match e {
        MarketDataError::RateLimited => FailureType::RateLimited,
        MarketDataError::BadResponse(msg)
            if msg.contains("404") || msg.to_lowercase().contains("not found") =>
        {
            FailureType::NotFound
        }
        _ => FailureType::ApiError,
    }
}

pub async fn refresh_from_api(
    pool: &PgPool,
    provider: &dyn MarketDataProvider,
    ticker: &str,
    failure_cache: &FailureCache,
    rate_limiter: &RateLimiter,
) -> Result<(), AppError> {
    // Known-bad tickers are skipped until their retry window opens. The
    // in-memory cache answers first; the table catches restarts.
    if let Some(info) = failure_cache.is_failed(ticker) {
        info!(
            "⚠️ Skipping price fetch for {} - recent {} failure",
            ticker,
            info.failure_type.as_str()
        );
        return Err(AppError::External(format!(
            "Ticker {} failed recently ({})",
            ticker,
            info.failure_type.as_str()
        )));
    }

    let should_retry = db::fetch_failure_queries::should_retry_ticker(pool, ticker)
        .await
        .map_err(|e| {
            error!("Failed to check failure cache for ticker {}: {}", ticker, e);
            AppError::Db(e)
        })?;

    if !should_retry {
        if let Ok(Some(failure)) =
            db::fetch_failure_queries::get_active_failure(pool, ticker).await
        {
            info!(
                "⚠️ Skipping price fetch for {} - in failure cache ({}), retry after {}",
                ticker, failure.failure_type, failure.retry_after
            );
            return Err(AppError::External(format!(
                "Ticker {} is in failure cache ({}), retry after {}",
                ticker, failure.failure_type, failure.retry_after
            )));
        }
    }

    // Skip the provider entirely when yesterday's close is already stored.
    if let Some(latest) = db::price_queries::fetch_latest(pool, ticker).await? {
        let today = Utc::now().date_naive();
        if latest.date >= today - ChronoDuration::days(1) {
            info!("✓ Skipping price fetch for {} - data is recent ({})", ticker, latest.date);
            return Ok(());
        }
    }

    let mut retry_count = 0;
    let max_retries = 3;

    loop {
        let _permit = rate_limiter.acquire().await;

        match provider.fetch_daily_history(ticker, HISTORY_DAYS).await {
            Ok(external_points) => {
                store_points(pool, ticker, &external_points).await?;

                failure_cache.clear(ticker);
                if let Err(e) = db::fetch_failure_queries::clear_fetch_failure(pool, ticker).await {
                    warn!("Failed to clear failure cache for ticker {}: {}", ticker, e);
                }

                info!("✓ Fetched {} price points for {}", external_points.len(), ticker);
                return Ok(());
            }
            Err(MarketDataError::RateLimited) if retry_count < max_retries => {
                retry_count += 1;
                let delay = Duration::from_secs(5 * retry_count as u64); // 5, 10, 15 seconds
                warn!(
                    "Rate limited fetching prices for {}, retrying in {}s (attempt {}/{})",
                    ticker, delay.as_secs(), retry_count, max_retries
                );
                async_sleep(delay).await;
            }
            Err(e) => {
                let failure_type = classify_failure(&e);
                failure_cache.record_failure(ticker, failure_type);

                if let Err(db_err) = db::fetch_failure_queries::record_fetch_failure(
                    pool,
                    ticker,
                    failure_type,
                    Some(&e.to_string()),
                )
                .await
                {
                    error!("Failed to record failure for ticker {}: {}", ticker, db_err);
                }

                error!("✗ Failed to fetch prices for {}: {}", ticker, e);
                return Err(match e {
                    MarketDataError::RateLimited => AppError::RateLimited,
                    _ => AppError::External(e.to_string()),
                });
            }
        }
    }
}

async fn store_points(
    pool: &PgPool,
    ticker: &str,
    points: &[ExternalPricePoint],
) -> Result<(), AppError> {
    db::price_queries::upsert_external_points(pool, ticker, points)
        .await
        .map_err(|e| {
            error!("Failed to store prices for ticker {}: {}", ticker, e);
            AppError::Db(e)
        })
}

/// Seed a year of synthetic closes for local development.
pub async fn generate_mock(pool: &PgPool, ticker: &str) -> Result<(), AppError> {
    let today = Utc::now().date_naive();
    let mut points: Vec<ExternalPricePoint> = Vec::new();

    let mut current = 100.0_f64;

    for i in 0..(HISTORY_DAYS as i64) {
        current *= 1.0 + (rand::random::<f64>() - 0.5) * 0.02;

        points.push(ExternalPricePoint {
            date: today - ChronoDuration::days(i),
            close: current,
        });
    }

    store_points(pool, ticker, &points).await
}
