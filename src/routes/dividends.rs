use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::DividendEvent;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_dividends))
        .route("/:ticker/update", post(update_dividends))
}

pub async fn get_dividends(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DividendEvent>>, AppError> {
    info!("GET /dividends/{} - Getting dividend history", ticker);
    let dividends = services::dividend_service::get_history(&state.pool, &ticker).await
        .map_err(|e| {
            error!("Failed to get dividend history for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(dividends))
}

pub async fn update_dividends(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    info!("POST /dividends/{}/update - Updating dividends from provider", ticker);
    services::dividend_service::refresh_from_api(
        &state.pool,
        state.market_provider.as_ref(),
        &ticker,
        &state.failure_cache,
        state.rate_limiter.as_ref(),
    ).await
        .map_err(|e| {
            match &e {
                AppError::RateLimited => warn!("Rate limited when updating dividends for {}", ticker),
                _ => error!("Failed to update dividends for {}: {}", ticker, e),
            }
            e
        })?;
    Ok(StatusCode::OK)
}
