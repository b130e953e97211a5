use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{DripSnapshot, DripWindow};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_drip))
        .route("/:ticker/all", get(get_drip_all_windows))
        .route("/:ticker/recalc", post(recalc_drip))
}

#[derive(Debug, Deserialize)]
pub struct DripQuery {
    pub window: Option<String>,
    #[serde(default)]
    pub force: bool,
}

fn parse_window(raw: Option<&str>) -> Result<DripWindow, AppError> {
    raw.unwrap_or("13w")
        .parse::<DripWindow>()
        .map_err(AppError::Validation)
}

pub async fn get_drip(
    Path(ticker): Path<String>,
    Query(query): Query<DripQuery>,
    State(state): State<AppState>,
) -> Result<Json<DripSnapshot>, AppError> {
    let window = parse_window(query.window.as_deref())?;
    info!("GET /drip/{} - DRIP performance over {}", ticker, window);

    let snapshot =
        services::drip_service::get_or_compute(&state.pool, &ticker, window, query.force)
            .await
            .map_err(|e| {
                error!("Failed to get DRIP for {} over {}: {}", ticker, window, e);
                e
            })?;
    Ok(Json(snapshot))
}

pub async fn get_drip_all_windows(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DripSnapshot>>, AppError> {
    info!("GET /drip/{}/all - DRIP performance over all windows", ticker);

    let snapshots = services::drip_service::compute_all_windows(&state.pool, &ticker, false)
        .await
        .map_err(|e| {
            error!("Failed to get DRIP windows for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(snapshots))
}

/// Force a fresh recomputation of every window, ignoring cached entries.
pub async fn recalc_drip(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DripSnapshot>>, AppError> {
    info!("POST /drip/{}/recalc - Forcing DRIP recalculation", ticker);

    let snapshots = services::drip_service::compute_all_windows(&state.pool, &ticker, true)
        .await
        .map_err(|e| {
            error!("Failed to recalculate DRIP for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(snapshots))
}
