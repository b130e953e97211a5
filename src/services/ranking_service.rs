use sqlx::PgPool;
use tracing::warn;

use crate::db;
use crate::errors::AppError;
use crate::models::{DripWindow, RankingEntry};

/// Active ETFs ranked by cached DRIP growth over the window, best first.
/// Tickers without a fresh snapshot simply don't appear; the nightly cache
/// job keeps the list populated.
pub async fn rankings(pool: &PgPool, window: DripWindow) -> Result<Vec<RankingEntry>, AppError> {
    let entries = db::drip_cache_queries::fetch_ranked(pool, window.days() as i32).await?;

    if entries.is_empty() {
        warn!("No fresh DRIP snapshots for the {} window", window);
    }

    Ok(entries)
}
