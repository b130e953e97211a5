use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// A dividend-paying ETF tracked by the ranking dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Etf {
    pub id: Uuid,
    pub ticker: String,
    pub name: String,
    pub currency: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEtf {
    pub ticker: String,
    pub name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UpdateEtf {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub active: Option<bool>,
}
