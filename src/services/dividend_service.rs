use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tokio::time::{sleep as async_sleep, Duration};
use tracing::{error, info, warn};

use crate::db;
use crate::errors::AppError;
use crate::external::market_provider::{MarketDataError, MarketDataProvider};
use crate::models::DividendEvent;
use crate::services::failure_cache::FailureCache;
use crate::services::price_service::{classify_failure, HISTORY_DAYS};
use crate::services::rate_limiter::RateLimiter;

pub async fn get_history(pool: &PgPool, ticker: &str) -> Result<Vec<DividendEvent>, AppError> {
    db::dividend_queries::fetch_all(pool, ticker).await.map_err(|e| {
        error!("Failed to fetch dividend history for ticker {}: {}", ticker, e);
        AppError::Db(e)
    })
}

pub async fn refresh_from_api(
    pool: &PgPool,
    provider: &dyn MarketDataProvider,
    ticker: &str,
    failure_cache: &FailureCache,
    rate_limiter: &RateLimiter,
) -> Result<(), AppError> {
    if let Some(info) = failure_cache.is_failed(ticker) {
        info!(
            "⚠️ Skipping dividend fetch for {} - recent {} failure",
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
        info!("⚠️ Skipping dividend fetch for {} - in failure cache", ticker);
        return Err(AppError::External(format!(
            "Ticker {} is in failure cache",
            ticker
        )));
    }

    // `created_at` tracks ingestion time; a row written in the last 12 hours
    // means this ticker's distributions were fetched recently enough.
    if let Some(latest) = db::dividend_queries::fetch_latest(pool, ticker).await? {
        if latest.created_at >= Utc::now() - ChronoDuration::hours(12) {
            info!("✓ Skipping dividend fetch for {} - refreshed recently", ticker);
            return Ok(());
        }
    }

    let mut retry_count = 0;
    let max_retries = 3;

    loop {
        let _permit = rate_limiter.acquire().await;

        match provider.fetch_dividend_history(ticker, HISTORY_DAYS).await {
            Ok(events) => {
                db::dividend_queries::upsert_external_events(pool, ticker, &events)
                    .await
                    .map_err(|e| {
                        error!("Failed to store dividends for ticker {}: {}", ticker, e);
                        AppError::Db(e)
                    })?;

                failure_cache.clear(ticker);
                if let Err(e) = db::fetch_failure_queries::clear_fetch_failure(pool, ticker).await {
                    warn!("Failed to clear failure cache for ticker {}: {}", ticker, e);
                }

                info!("✓ Fetched {} dividend events for {}", events.len(), ticker);
                return Ok(());
            }
            Err(MarketDataError::RateLimited) if retry_count < max_retries => {
                retry_count += 1;
                let delay = Duration::from_secs(5 * retry_count as u64);
                warn!(
                    "Rate limited fetching dividends for {}, retrying in {}s (attempt {}/{})",
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

                error!("✗ Failed to fetch dividends for {}: {}", ticker, e);
                return Err(match e {
                    MarketDataError::RateLimited => AppError::RateLimited,
                    _ => AppError::External(e.to_string()),
                });
            }
        }
    }
}
