use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestRow {
    pub id: Uuid,
    pub job_id: Option<i64>,
    pub recruiter_id: Uuid,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: String,
    pub results_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestQuestionRow {
    pub id: Uuid,
    pub test_id: Uuid,
    pub question_text: String,
    pub question_type: String,
    pub options: Option<Value>,
    pub expected_answer: String,
    pub question_order: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttemptRow {
    pub id: Uuid,
    pub test_id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub auto_submitted: bool,
    pub time_taken_seconds: Option<i32>,
    pub total_score: Option<i32>,
    pub max_score: Option<i32>,
    pub status: String,
    pub violation_count: i32,
    pub last_active_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestAnswerRow {
    pub question_id: Uuid,
    pub candidate_answer: String,
    pub is_correct: Option<bool>,
}
