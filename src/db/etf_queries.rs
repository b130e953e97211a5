use sqlx::PgPool;
use uuid::Uuid;
use crate::models::{CreateEtf, Etf, UpdateEtf};

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Etf>, sqlx::Error> {
    sqlx::query_as::<_, Etf>(
        "SELECT id, ticker, name, currency, active, created_at
         FROM etfs
         ORDER BY ticker ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_active(pool: &PgPool) -> Result<Vec<Etf>, sqlx::Error> {
    sqlx::query_as::<_, Etf>(
        "SELECT id, ticker, name, currency, active, created_at
         FROM etfs
         WHERE active
         ORDER BY ticker ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_by_ticker(pool: &PgPool, ticker: &str) -> Result<Option<Etf>, sqlx::Error> {
    sqlx::query_as::<_, Etf>(
        "SELECT id, ticker, name, currency, active, created_at
         FROM etfs
         WHERE ticker = $1",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, input: CreateEtf) -> Result<Etf, sqlx::Error> {
    sqlx::query_as::<_, Etf>(
        "INSERT INTO etfs (id, ticker, name, currency, active)
         VALUES ($1, $2, $3, $4, TRUE)
         RETURNING id, ticker, name, currency, active, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(input.ticker)
    .bind(input.name)
    .bind(input.currency)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    ticker: &str,
    input: UpdateEtf,
) -> Result<Option<Etf>, sqlx::Error> {
    sqlx::query_as::<_, Etf>(
        "UPDATE etfs
         SET name = COALESCE($1, name),
             currency = COALESCE($2, currency),
             active = COALESCE($3, active)
         WHERE ticker = $4
         RETURNING id, ticker, name, currency, active, created_at",
    )
    .bind(input.name)
    .bind(input.currency)
    .bind(input.active)
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, ticker: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM etfs WHERE ticker = $1")
        .bind(ticker)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
