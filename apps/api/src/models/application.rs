use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: i64,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub resume_id: Option<Uuid>,
    pub resume_name: String,
    #[serde(skip)]
    pub resume_key: String,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub test_id: Option<Uuid>,
    pub test_score: Option<f64>,
    pub test_status: String,
    pub test_attempted_at: Option<DateTime<Utc>>,
    pub match_score: Option<i32>,
    pub shortlisted_by_ai: bool,
}
