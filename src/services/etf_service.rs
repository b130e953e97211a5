use sqlx::PgPool;
use tracing::error;

use crate::db;
use crate::errors::AppError;
use crate::models::{CreateEtf, Etf, UpdateEtf};

pub async fn create(pool: &PgPool, mut input: CreateEtf) -> Result<Etf, AppError> {
    input.ticker = input.ticker.trim().to_uppercase();
    if input.ticker.is_empty() {
        return Err(AppError::Validation("Ticker must not be empty".to_string()));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Name must not be empty".to_string()));
    }

    if db::etf_queries::fetch_by_ticker(pool, &input.ticker).await?.is_some() {
        return Err(AppError::Validation(format!(
            "ETF {} already exists",
            input.ticker
        )));
    }

    db::etf_queries::insert(pool, input).await.map_err(|e| {
        error!("Failed to create ETF: {}", e);
        AppError::Db(e)
    })
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Etf>, AppError> {
    Ok(db::etf_queries::fetch_all(pool).await?)
}

pub async fn fetch_active(pool: &PgPool) -> Result<Vec<Etf>, AppError> {
    Ok(db::etf_queries::fetch_active(pool).await?)
}

pub async fn fetch_one(pool: &PgPool, ticker: &str) -> Result<Etf, AppError> {
    db::etf_queries::fetch_by_ticker(pool, ticker)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ETF {} not found", ticker)))
}

pub async fn update(pool: &PgPool, ticker: &str, input: UpdateEtf) -> Result<Etf, AppError> {
    db::etf_queries::update(pool, ticker, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ETF {} not found", ticker)))
}

pub async fn delete(pool: &PgPool, ticker: &str) -> Result<(), AppError> {
    let deleted = db::etf_queries::delete(pool, ticker).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("ETF {} not found", ticker)));
    }
    Ok(())
}
