use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::db;
use crate::errors::AppError;
use crate::models::JobRun;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cache-health", get(get_cache_health))
        .route("/invalidate-cache/:ticker", post(invalidate_cache))
        .route("/jobs/recent", get(get_recent_job_runs))
        .route("/jobs/:job_name/history", get(get_job_history))
}

/// Health of the DRIP snapshot cache.
#[derive(Debug, Serialize)]
pub struct CacheHealthStatus {
    pub checked_at: DateTime<Utc>,
    pub status: CacheHealthLevel,
    pub total_entries: i64,
    pub fresh_entries: i64,
    pub stale_entries: i64,
    /// Snapshots computed with at least one skipped dividend - valid but
    /// built on an incomplete price history.
    pub degraded_entries: i64,
    pub freshness_pct: f64,
    pub avg_age_hours: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CacheHealthLevel {
    Healthy,
    Degraded,
    Critical,
}

pub async fn get_cache_health(
    State(state): State<AppState>,
) -> Result<Json<CacheHealthStatus>, AppError> {
    info!("GET /admin/cache-health - Checking DRIP cache health");

    let (total, fresh, stale, degraded, avg_age_hours) =
        db::drip_cache_queries::cache_stats(&state.pool).await?;

    let freshness_pct = if total > 0 {
        (fresh as f64 / total as f64) * 100.0
    } else {
        100.0
    };

    let status = if freshness_pct < 50.0 {
        CacheHealthLevel::Critical
    } else if freshness_pct < 80.0 || degraded > 0 {
        CacheHealthLevel::Degraded
    } else {
        CacheHealthLevel::Healthy
    };

    info!(
        "Cache health: {:.1}% fresh ({} of {}), {} degraded",
        freshness_pct, fresh, total, degraded
    );

    Ok(Json(CacheHealthStatus {
        checked_at: Utc::now(),
        status,
        total_entries: total,
        fresh_entries: fresh,
        stale_entries: stale,
        degraded_entries: degraded,
        freshness_pct,
        avg_age_hours,
    }))
}

#[derive(Debug, Serialize)]
pub struct InvalidateCacheResponse {
    pub ticker: String,
    pub entries_invalidated: u64,
    pub invalidated_at: DateTime<Utc>,
}

/// Force-expire every cached window for a ticker so the next read
/// recomputes from stored history.
pub async fn invalidate_cache(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<InvalidateCacheResponse>, AppError> {
    info!("POST /admin/invalidate-cache/{} - Invalidating DRIP cache", ticker);

    let invalidated = db::drip_cache_queries::invalidate_ticker(&state.pool, &ticker)
        .await
        .map_err(|e| {
            error!("Failed to invalidate cache for {}: {}", ticker, e);
            AppError::Db(e)
        })?;

    if invalidated == 0 {
        warn!("No fresh cache entries found for {} to invalidate", ticker);
    } else {
        info!("Invalidated {} cache entries for {}", invalidated, ticker);
    }

    Ok(Json(InvalidateCacheResponse {
        ticker,
        entries_invalidated: invalidated,
        invalidated_at: Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct JobRunsQuery {
    pub limit: Option<i64>,
}

pub async fn get_recent_job_runs(
    Query(query): Query<JobRunsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRun>>, AppError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    info!("GET /admin/jobs/recent - Last {} job runs", limit);

    let runs = db::job_run_queries::fetch_recent(&state.pool, limit).await?;
    Ok(Json(runs))
}

pub async fn get_job_history(
    Path(job_name): Path<String>,
    Query(query): Query<JobRunsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRun>>, AppError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    info!("GET /admin/jobs/{}/history - Last {} runs", job_name, limit);

    let runs = db::job_run_queries::fetch_history(&state.pool, &job_name, limit).await?;
    Ok(Json(runs))
}
