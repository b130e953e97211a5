use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::{dividend_service, price_service};
use tracing::{info, warn};

const INTER_TICKER_DELAY_MS: u64 = 500;

/// Refresh prices and dividends for every active ETF. One ticker failing
/// does not stop the sweep; the failure cache keeps known-bad tickers from
/// burning quota on the next run.
pub async fn refresh_all_market_data(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("💰 Refreshing market data for all active ETFs...");

    let etfs = crate::db::etf_queries::fetch_active(ctx.pool.as_ref()).await?;

    let mut processed = 0;
    let mut failed = 0;

    for etf in etfs {
        let price_result = price_service::refresh_from_api(
            ctx.pool.as_ref(),
            ctx.market_provider.as_ref(),
            &etf.ticker,
            &ctx.failure_cache,
            ctx.rate_limiter.as_ref(),
        )
        .await;

        let dividend_result = dividend_service::refresh_from_api(
            ctx.pool.as_ref(),
            ctx.market_provider.as_ref(),
            &etf.ticker,
            &ctx.failure_cache,
            ctx.rate_limiter.as_ref(),
        )
        .await;

        match (price_result, dividend_result) {
            (Ok(_), Ok(_)) => {
                processed += 1;
                info!("✅ Refreshed market data for {}", etf.ticker);
            }
            (price, dividend) => {
                failed += 1;
                if let Err(e) = price {
                    warn!("❌ Price refresh failed for {}: {}", etf.ticker, e);
                }
                if let Err(e) = dividend {
                    warn!("❌ Dividend refresh failed for {}: {}", etf.ticker, e);
                }
            }
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(INTER_TICKER_DELAY_MS)).await;
    }

    Ok(JobResult {
        items_processed: processed,
        items_failed: failed,
    })
}
