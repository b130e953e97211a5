use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// One execution of a scheduled background job.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobRun {
    pub id: i32,
    pub job_name: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_processed: Option<i32>,
    pub items_failed: Option<i32>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
}
