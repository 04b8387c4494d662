use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::Recruiter;
use crate::companies::handlers::find_company_for;
use crate::errors::AppError;
use crate::models::job::{JobQuestionRow, JobRow};
use crate::models::{ExperienceLevel, JobStatus, QuestionType};
use crate::state::AppState;

const JOB_SELECT: &str = r#"
    SELECT jp.*, c.name AS company_name
    FROM job_postings jp
    JOIN companies c ON c.id = jp.company_id
"#;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub count: usize,
    pub data: Vec<JobRow>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionInput {
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub is_required: Option<bool>,
    pub expected_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_description: Option<String>,
    pub required_skills: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    pub job: JobRow,
    pub questions: Vec<JobQuestionRow>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobStatusRequest {
    pub status: String,
}

/// A validated screening question ready for insertion.
#[derive(Debug, PartialEq)]
struct NewQuestion {
    text: String,
    kind: QuestionType,
    options: Vec<String>,
    is_required: bool,
    expected_answer: Option<String>,
}

/// `None` lists every job that is not deleted.
fn status_filter(raw: Option<&str>) -> Result<Option<JobStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("open") => Ok(Some(JobStatus::Open)),
        Some("all") => Ok(None),
        Some("closed") => Ok(Some(JobStatus::Closed)),
        Some(other) => Err(AppError::Validation(format!(
            "Invalid status filter '{other}'. Use all, open or closed"
        ))),
    }
}

fn validate_question(index: usize, input: &QuestionInput) -> Result<NewQuestion, AppError> {
    let position = index + 1;
    let text = input
        .question_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Question {position} has no text")))?;
    let kind: QuestionType = input
        .question_type
        .as_deref()
        .unwrap_or("text")
        .parse()
        .map_err(|e: String| AppError::Validation(format!("Question {position}: {e}")))?;

    let options: Vec<String> = input
        .options
        .iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if kind == QuestionType::Dropdown && options.is_empty() {
        return Err(AppError::Validation(format!(
            "Question {position} is a dropdown and needs at least one option"
        )));
    }

    Ok(NewQuestion {
        text: text.to_string(),
        kind,
        options,
        is_required: input.is_required.unwrap_or(true),
        expected_answer: input
            .expected_answer
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string),
    })
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = match status_filter(params.status.as_deref())? {
        Some(status) => {
            sqlx::query_as::<_, JobRow>(&format!(
                "{JOB_SELECT} WHERE jp.status = $1 ORDER BY jp.created_at DESC"
            ))
            .bind(status.as_str())
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, JobRow>(&format!(
                "{JOB_SELECT} WHERE jp.status <> 'deleted' ORDER BY jp.created_at DESC"
            ))
            .fetch_all(&state.db)
            .await?
        }
    };

    Ok(Json(JobListResponse {
        count: jobs.len(),
        data: jobs,
    }))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobDetailResponse>), AppError> {
    let required = [
        ("job_title", req.job_title.as_deref()),
        ("department", req.department.as_deref()),
        ("job_type", req.job_type.as_deref()),
        ("experience_level", req.experience_level.as_deref()),
        ("job_description", req.job_description.as_deref()),
        ("required_skills", req.required_skills.as_deref()),
    ];
    crate::auth::validation::require_all(&required)?;

    let experience_level: ExperienceLevel = req
        .experience_level
        .as_deref()
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(AppError::Validation)?;
    if let (Some(min), Some(max)) = (req.salary_min, req.salary_max) {
        if min > max {
            return Err(AppError::Validation(
                "salary_min cannot be greater than salary_max".into(),
            ));
        }
    }
    let questions = req
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| validate_question(i, q))
        .collect::<Result<Vec<_>, _>>()?;

    let company = find_company_for(&state, user.id).await?.ok_or_else(|| {
        AppError::Validation("Create your company profile before posting jobs".into())
    })?;

    let mut tx = state.db.begin().await?;

    let (job_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO job_postings
            (company_id, job_title, department, job_type, experience_level, location,
             salary_min, salary_max, job_description, required_skills, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'open')
        RETURNING job_id
        "#,
    )
    .bind(company.id)
    .bind(req.job_title.as_deref().map(str::trim))
    .bind(req.department.as_deref().map(str::trim))
    .bind(req.job_type.as_deref().map(str::trim))
    .bind(experience_level.as_str())
    .bind(&req.location)
    .bind(req.salary_min)
    .bind(req.salary_max)
    .bind(&req.job_description)
    .bind(&req.required_skills)
    .fetch_one(&mut *tx)
    .await?;

    for (order, q) in questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO job_questions
                (job_id, question_text, question_type, options, is_required,
                 expected_answer, question_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(job_id)
        .bind(&q.text)
        .bind(q.kind.as_str())
        .bind(&q.options)
        .bind(q.is_required)
        .bind(&q.expected_answer)
        .bind(order as i32)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(
        "Job {job_id} posted by company {} with {} screening questions",
        company.id,
        questions.len()
    );

    let job = fetch_job(&state, job_id).await?;
    let questions = fetch_questions(&state, job_id, true).await?;
    Ok((StatusCode::CREATED, Json(JobDetailResponse { job, questions })))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job = fetch_job(&state, job_id).await?;
    let questions = fetch_questions(&state, job_id, false).await?;
    Ok(Json(JobDetailResponse { job, questions }))
}

/// PATCH /api/jobs/:id/status
pub async fn handle_update_job_status(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(job_id): Path<i64>,
    Json(req): Json<UpdateJobStatusRequest>,
) -> Result<Json<JobRow>, AppError> {
    let status: JobStatus = req.status.trim().parse().map_err(AppError::Validation)?;

    let updated = sqlx::query(
        r#"
        UPDATE job_postings jp
        SET status = $1, updated_at = NOW()
        FROM companies c
        WHERE jp.company_id = c.id AND c.created_by = $2 AND jp.job_id = $3
        "#,
    )
    .bind(status.as_str())
    .bind(user.id)
    .bind(job_id)
    .execute(&state.db)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Job {job_id} not found or access denied"
        )));
    }
    info!("Job {job_id} set to {status} by {}", user.id);

    let job = sqlx::query_as::<_, JobRow>(&format!("{JOB_SELECT} WHERE jp.job_id = $1"))
        .bind(job_id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(job))
}

/// A job visible to the public: anything but deleted.
pub async fn fetch_job(state: &AppState, job_id: i64) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>(&format!(
        "{JOB_SELECT} WHERE jp.job_id = $1 AND jp.status <> 'deleted'"
    ))
    .bind(job_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Job not found".into()))
}

/// Screening questions in display order. Expected answers are only loaded
/// for the recruiter view.
pub async fn fetch_questions(
    state: &AppState,
    job_id: i64,
    include_expected: bool,
) -> Result<Vec<JobQuestionRow>, AppError> {
    Ok(sqlx::query_as::<_, JobQuestionRow>(
        r#"
        SELECT id, job_id, question_text, question_type, options, is_required,
               CASE WHEN $2 THEN expected_answer ELSE NULL END AS expected_answer,
               question_order
        FROM job_questions
        WHERE job_id = $1
        ORDER BY question_order, created_at
        "#,
    )
    .bind(job_id)
    .bind(include_expected)
    .fetch_all(&state.db)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, kind: &str, options: &[&str]) -> QuestionInput {
        QuestionInput {
            question_text: Some(text.to_string()),
            question_type: Some(kind.to_string()),
            options: options.iter().map(|o| o.to_string()).collect(),
            is_required: None,
            expected_answer: Some("  yes ".to_string()),
        }
    }

    #[test]
    fn test_status_filter_defaults_to_open() {
        assert_eq!(status_filter(None).unwrap(), Some(JobStatus::Open));
        assert_eq!(status_filter(Some("closed")).unwrap(), Some(JobStatus::Closed));
        assert_eq!(status_filter(Some("all")).unwrap(), None);
        assert!(status_filter(Some("deleted")).is_err());
    }

    #[test]
    fn test_question_defaults() {
        let q = validate_question(0, &question(" Notice period? ", "text", &[])).unwrap();
        assert_eq!(q.text, "Notice period?");
        assert!(q.is_required);
        assert_eq!(q.expected_answer.as_deref(), Some("yes"));
    }

    #[test]
    fn test_dropdown_needs_options() {
        assert!(validate_question(0, &question("Shift", "dropdown", &[" "])).is_err());
        let q = validate_question(0, &question("Shift", "dropdown", &["Day", "Night"])).unwrap();
        assert_eq!(q.options, vec!["Day", "Night"]);
    }

    #[test]
    fn test_unknown_question_type() {
        let err = validate_question(2, &question("Age", "slider", &[])).unwrap_err();
        assert!(err.to_string().contains("Question 3"));
    }
}
