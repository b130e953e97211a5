use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{CreateEtf, Etf, UpdateEtf};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_etf).get(fetch_etfs))
        .route("/:ticker", get(get_etf))
        .route("/:ticker", put(update_etf))
        .route("/:ticker", delete(delete_etf))
}

pub async fn create_etf(
    State(state): State<AppState>,
    Json(data): Json<CreateEtf>,
) -> Result<Json<Etf>, AppError> {
    info!("POST /etfs - Creating new ETF");
    let etf = services::etf_service::create(&state.pool, data).await.map_err(|e| {
        error!("Failed to create ETF: {}", e);
        e
    })?;
    Ok(Json(etf))
}

pub async fn fetch_etfs(State(state): State<AppState>) -> Result<Json<Vec<Etf>>, AppError> {
    info!("GET /etfs - Fetching all ETFs");
    let etfs = services::etf_service::fetch_all(&state.pool).await.map_err(|e| {
        error!("Failed to fetch ETFs: {}", e);
        e
    })?;
    Ok(Json(etfs))
}

pub async fn get_etf(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Etf>, AppError> {
    info!("GET /etfs/{} - Fetching ETF", ticker);
    let etf = services::etf_service::fetch_one(&state.pool, &ticker).await.map_err(|e| {
        error!("Failed to fetch ETF {}: {}", ticker, e);
        e
    })?;
    Ok(Json(etf))
}

pub async fn update_etf(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Json(data): Json<UpdateEtf>,
) -> Result<Json<Etf>, AppError> {
    info!("PUT /etfs/{} - Updating ETF", ticker);
    let etf = services::etf_service::update(&state.pool, &ticker, data).await.map_err(|e| {
        error!("Failed to update ETF {}: {}", ticker, e);
        e
    })?;
    Ok(Json(etf))
}

pub async fn delete_etf(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /etfs/{} - Deleting ETF", ticker);
    services::etf_service::delete(&state.pool, &ticker).await.map_err(|e| {
        error!("Failed to delete ETF {}: {}", ticker, e);
        e
    })?;
    Ok(StatusCode::NO_CONTENT)
}
