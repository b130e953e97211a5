use crate::db;
use crate::errors::AppError;
use crate::external::market_provider::MarketDataProvider;
use crate::jobs::{cache_cleanup_job, drip_cache_refresh_job, market_data_refresh_job};
use crate::services::failure_cache::FailureCache;
use crate::services::rate_limiter::RateLimiter;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: Arc<PgPool>,
    pub market_provider: Arc<dyn MarketDataProvider>,
    pub failure_cache: Arc<FailureCache>,
    pub rate_limiter: Arc<RateLimiter>,
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(
        pool: Arc<PgPool>,
        market_provider: Arc<dyn MarketDataProvider>,
        failure_cache: Arc<FailureCache>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context: JobContext {
                pool,
                market_provider,
                failure_cache,
                rate_limiter,
            },
        })
    }

    /// Register and start all scheduled jobs.
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        // Test mode collapses schedules to minutes for local verification
        let test_mode = std::env::var("JOB_SCHEDULER_TEST_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        if test_mode {
            info!("⚠️  JOB SCHEDULER IN TEST MODE - jobs run every few minutes!");
        }

        // format: sec min hour day month weekday
        let market_data_schedule = if test_mode { "0 */2 * * * *" } else { "0 0 2 * * *" };
        let market_data_desc = if test_mode { "Every 2 minutes (TEST MODE)" } else { "Daily at 2:00 AM" };

        self.schedule_job(
            market_data_schedule,
            "refresh_market_data",
            market_data_desc,
            market_data_refresh_job::refresh_all_market_data,
        )
        .await?;

        // After market data so snapshots see fresh closes
        let drip_schedule = if test_mode { "0 */5 * * * *" } else { "0 0 3 * * *" };
        let drip_desc = if test_mode { "Every 5 minutes (TEST MODE)" } else { "Daily at 3:00 AM" };

        self.schedule_job(
            drip_schedule,
            "refresh_drip_cache",
            drip_desc,
            drip_cache_refresh_job::refresh_all_drip_snapshots,
        )
        .await?;

        let cleanup_schedule = if test_mode { "0 */10 * * * *" } else { "0 0 4 * * SUN" };
        let cleanup_desc = if test_mode { "Every 10 minutes (TEST MODE)" } else { "Every Sunday at 4:00 AM" };

        self.schedule_job(
            cleanup_schedule,
            "cleanup_expired",
            cleanup_desc,
            cache_cleanup_job::cleanup_expired,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started with 3 jobs");
        Ok(())
    }

    /// Helper to schedule a job with run tracking
    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                let pool = context.pool.clone();
                execute_job_with_tracking(pool.as_ref(), job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

// Job tracking wrapper
async fn execute_job_with_tracking<F, Fut>(
    pool: &PgPool,
    job_name: &str,
    context: JobContext,
    job_fn: Arc<F>,
) where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let job_id = match db::job_run_queries::record_start(pool, job_name).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to record job start: {}", e);
            return;
        }
    };

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );

            if let Err(e) = db::job_run_queries::record_success(
                pool,
                job_id,
                job_result.items_processed,
                job_result.items_failed,
                duration_ms,
            )
            .await
            {
                error!("Failed to record job success: {}", e);
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);

            if let Err(e) =
                db::job_run_queries::record_failure(pool, job_id, &e.to_string(), duration_ms).await
            {
                error!("Failed to record job failure: {}", e);
            }
        }
    }
}
