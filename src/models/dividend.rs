use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// One cash distribution per ticker per ex-date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DividendEvent {
    pub id: Uuid,
    pub ticker: String,
    pub ex_date: NaiveDate,
    pub amount_per_share: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}
