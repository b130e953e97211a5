use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{DripWindow, RankingEntry};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_rankings))
}

#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
    pub window: Option<String>,
}

pub async fn get_rankings(
    Query(query): Query<RankingsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<RankingEntry>>, AppError> {
    let window = query
        .window
        .as_deref()
        .unwrap_or("13w")
        .parse::<DripWindow>()
        .map_err(AppError::Validation)?;

    info!("GET /rankings - Ranking active ETFs over {}", window);

    let entries = services::ranking_service::rankings(&state.pool, window).await.map_err(|e| {
        error!("Failed to rank ETFs over {}: {}", window, e);
        e
    })?;
    Ok(Json(entries))
}
