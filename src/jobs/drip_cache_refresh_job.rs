use crate::db;
use crate::errors::AppError;
use crate::services::drip_service;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use chrono::Utc;
use crate::models::DripWindow;
use tracing::{info, warn};

/// Recompute every (active ETF, window) snapshot from stored history.
/// Windows without enough data are skipped quietly - tickers gain windows as
/// their ingested history grows.
pub async fn refresh_all_drip_snapshots(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("📈 Recomputing DRIP snapshots for all active ETFs...");

    let etfs = db::etf_queries::fetch_active(ctx.pool.as_ref()).await?;
    let as_of = Utc::now().date_naive();

    let mut processed = 0;
    let mut failed = 0;

    for etf in etfs {
        for window in DripWindow::ALL {
            match drip_service::compute_and_store(ctx.pool.as_ref(), &etf.ticker, window, as_of)
                .await
            {
                Ok(_) => processed += 1,
                Err(AppError::NotFound(msg)) => {
                    info!("Skipping {} {}: {}", etf.ticker, window, msg);
                }
                Err(e) => {
                    failed += 1;
                    warn!("❌ DRIP recompute failed for {} {}: {}", etf.ticker, window, e);
                }
            }
        }
    }

    Ok(JobResult {
        items_processed: processed,
        items_failed: failed,
    })
}
