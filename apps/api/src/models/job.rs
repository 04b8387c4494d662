use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting joined with the name of the company that owns it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobRow {
    pub job_id: i64,
    pub company_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub department: String,
    pub job_type: String,
    pub experience_level: String,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_description: String,
    pub required_skills: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobQuestionRow {
    pub id: Uuid,
    pub job_id: i64,
    pub question_text: String,
    pub question_type: String,
    pub options: Vec<String>,
    pub is_required: bool,
    /// Recruiter-only; stripped before a question reaches a candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    pub question_order: i32,
}
