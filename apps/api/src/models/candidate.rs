use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub profile_description: Option<String>,
    pub skills: Vec<String>,
    pub is_fresher: bool,
    pub experience_years: i32,
    #[serde(skip)]
    pub resume_key: Option<String>,
    #[serde(skip)]
    pub resume_mime: Option<String>,
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<f64>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub experience_location: Option<String>,
    pub exp_start_date: Option<NaiveDate>,
    pub exp_end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub experience_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub grade_or_cgpa: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExperienceRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub employment_type: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AchievementRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub title: String,
    pub issuer: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub project_title: String,
    pub project_description: Option<String>,
    pub technologies_used: Vec<String>,
    pub project_link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Resume library entry. The file itself lives in object storage.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub resume_name: String,
    #[serde(skip)]
    pub storage_key: String,
    pub file_size_kb: i32,
    pub mime_type: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
