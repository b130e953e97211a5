use std::sync::Arc;
use sqlx::PgPool;
use crate::external::market_provider::MarketDataProvider;
use crate::services::failure_cache::FailureCache;
use crate::services::rate_limiter::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub market_provider: Arc<dyn MarketDataProvider>,
    pub failure_cache: FailureCache,
    pub rate_limiter: Arc<RateLimiter>,
}
