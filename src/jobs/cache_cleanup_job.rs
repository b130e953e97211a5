use crate::db;
use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::info;

/// Delete expired DRIP snapshots and fetch-failure rows.
pub async fn cleanup_expired(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("🧹 Cleaning up expired cache rows...");

    let snapshots = db::drip_cache_queries::delete_expired(ctx.pool.as_ref()).await?;
    info!("🗑️ Deleted {} expired DRIP snapshots", snapshots);

    let failures = db::fetch_failure_queries::delete_expired(ctx.pool.as_ref()).await?;
    info!("🗑️ Deleted {} expired fetch failures", failures);

    Ok(JobResult {
        items_processed: (snapshots + failures) as i32,
        items_failed: 0,
    })
}
