mod app;
mod db;
mod errors;
mod external;
mod jobs;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::external::eodhd::EodhdProvider;
use crate::external::market_provider::MarketDataProvider;
use crate::external::multi_provider::MultiProvider;
use crate::external::polygon::PolygonProvider;
use crate::external::yahoo::YahooProvider;
use crate::services::failure_cache::FailureCache;
use crate::services::job_scheduler_service::JobSchedulerService;
use crate::services::rate_limiter::RateLimiter;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(logging::LoggingConfig::from_env())?;

    let database_url = std::env::var("DATABASE_URL")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    let provider = build_provider();
    let failure_cache = FailureCache::new();
    // Sized for the strictest free tier among the configured providers
    let rate_limiter = Arc::new(RateLimiter::new(3, 8));

    let mut scheduler = JobSchedulerService::new(
        Arc::new(pool.clone()),
        provider.clone(),
        Arc::new(failure_cache.clone()),
        rate_limiter.clone(),
    )
    .await?;
    scheduler.start().await?;

    let state = AppState {
        pool,
        market_provider: provider,
        failure_cache,
        rate_limiter,
    };
    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 HillJump backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// Select the market-data provider from MARKET_PROVIDER (defaults to multi).
fn build_provider() -> Arc<dyn MarketDataProvider> {
    let provider_name =
        std::env::var("MARKET_PROVIDER").unwrap_or_else(|_| "multi".to_string());

    match provider_name.to_lowercase().as_str() {
        "yahoo" => {
            tracing::info!("📊 Using market data provider: Yahoo Finance only");
            Arc::new(YahooProvider::new())
        }
        "polygon" => {
            tracing::info!("📊 Using market data provider: Polygon only");
            Arc::new(PolygonProvider::from_env()
                .expect("Failed to create PolygonProvider (check POLYGON_API_KEY)"))
        }
        "eodhd" => {
            tracing::info!("📊 Using market data provider: EODHD only");
            Arc::new(EodhdProvider::from_env()
                .expect("Failed to create EodhdProvider (check EODHD_API_TOKEN)"))
        }
        "multi" => {
            tracing::info!("📊 Using market data provider: Multi (Yahoo + Polygon + EODHD fallback)");
            let primary = Box::new(YahooProvider::new());
            let fallback = Box::new(PolygonProvider::from_env()
                .expect("Failed to create PolygonProvider (check POLYGON_API_KEY)"));
            let last_resort = Box::new(EodhdProvider::from_env()
                .expect("Failed to create EodhdProvider (check EODHD_API_TOKEN)"));
            Arc::new(MultiProvider::new(primary, fallback, last_resort))
        }
        _ => {
            panic!("Invalid MARKET_PROVIDER: {}. Must be 'yahoo', 'polygon', 'eodhd' or 'multi'", provider_name);
        }
    }
}
