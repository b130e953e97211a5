use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// Persistent record of a failed provider fetch; blocks re-fetching the
// ticker until retry_after.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FetchFailure {
    pub ticker: String,
    pub failure_type: String,
    pub error_message: Option<String>,
    pub failed_at: DateTime<Utc>,
    pub retry_after: DateTime<Utc>,
}
