use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// One closing price per ticker per trading day, immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PricePoint {
    pub id: Uuid,
    pub ticker: String,
    pub date: NaiveDate,
    pub close_price: f64,
    pub created_at: DateTime<Utc>,
}
