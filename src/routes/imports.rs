use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

use crate::errors::AppError;
use crate::services::csv_import_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(import_csv))
        .route("/files", get(list_csv_files))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub file_path: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub kind: String,
    pub rows_imported: usize,
    pub tickers_touched: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CsvFileInfo {
    pub name: String,
    pub path: String,
    pub file_type: String, // "prices" or "dividends"
}

pub async fn list_csv_files() -> Result<Json<Vec<CsvFileInfo>>, AppError> {
    info!("GET /imports/files - Listing available CSV files");

    let data_dir = PathBuf::from("data");

    if !data_dir.exists() {
        return Ok(Json(vec![]));
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(&data_dir).map_err(|e| {
        error!("Failed to read data directory: {}", e);
        AppError::Validation(format!("Failed to read data directory: {}", e))
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !filename.ends_with(".csv") {
            continue;
        }

        if let Some(file_type) = file_type_for(filename) {
            files.push(CsvFileInfo {
                name: filename.to_string(),
                path: path.to_string_lossy().to_string(),
                file_type: file_type.to_string(),
            });
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    info!("Found {} CSV files", files.len());
    Ok(Json(files))
}

// Expected naming: Prices-*.csv / Dividends-*.csv
fn file_type_for(filename: &str) -> Option<&'static str> {
    let lower = filename.to_lowercase();
    if lower.starts_with("prices") {
        Some("prices")
    } else if lower.starts_with("dividends") {
        Some("dividends")
    } else {
        None
    }
}

pub async fn import_csv(
    State(state): State<AppState>,
    Json(data): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    info!("POST /imports - Importing CSV file: {}", data.file_path);

    let file_path = PathBuf::from(&data.file_path);

    if !file_path.exists() {
        error!("File does not exist: {}", data.file_path);
        return Err(AppError::Validation("File does not exist".to_string()));
    }

    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

    let file_type = file_type_for(filename).ok_or_else(|| {
        AppError::Validation(
            "Filename must start with 'Prices' or 'Dividends' to pick an import kind".to_string(),
        )
    })?;

    let result = match file_type {
        "prices" => csv_import_service::import_prices_file(&state.pool, &file_path).await,
        _ => csv_import_service::import_dividends_file(&state.pool, &file_path).await,
    }
    .map_err(|e| {
        error!("Failed to import CSV file: {}", e);
        AppError::Validation(format!("Failed to import CSV: {}", e))
    })?;

    info!(
        "Import completed: {} rows across {} tickers, {} errors",
        result.rows_imported,
        result.tickers_touched,
        result.errors.len()
    );

    Ok(Json(ImportResponse {
        kind: file_type.to_string(),
        rows_imported: result.rows_imported,
        tickers_touched: result.tickers_touched,
        errors: result.errors,
    }))
}
