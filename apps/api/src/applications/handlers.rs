use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{JobSeeker, Recruiter};
use crate::candidates::profile::find_candidate_id;
use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::files::inline_file;
use crate::models::application::ApplicationRow;
use crate::models::{ApplicationStatus, JobStatus};
use crate::notifications::{notify, NewNotification, APPLICATION_STATUS};
use crate::state::AppState;
use crate::storage::application_resume_key;

#[derive(Debug, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub resume_id: Option<Uuid>,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub message: &'static str,
    pub application_id: Uuid,
}

/// An application as the candidate sees it.
#[derive(Debug, Serialize, FromRow)]
pub struct MyApplicationRow {
    pub id: Uuid,
    pub job_id: i64,
    pub job_title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub job_type: String,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub resume_name: String,
    pub test_id: Option<Uuid>,
    pub test_status: String,
    pub test_score: Option<f64>,
}

/// An applicant to a single job, with screening answers bundled as
/// `[{question, answer, type}]`.
#[derive(Debug, Serialize, FromRow)]
pub struct JobApplicantRow {
    pub id: Uuid,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub resume_id: Option<Uuid>,
    pub resume_name: String,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub experience_years: i32,
    pub test_status: String,
    pub test_score: Option<f64>,
    pub match_score: Option<i32>,
    pub answers: Value,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RecruiterApplicationRow {
    pub id: Uuid,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub job_id: i64,
    pub job_title: String,
    pub resume_id: Option<Uuid>,
    pub resume_name: String,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub experience: i32,
    pub skills: Vec<String>,
    pub test_status: String,
    pub test_score: Option<f64>,
    pub match_score: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    /// Whether the candidate is told about the change. Defaults to yes.
    pub notify: Option<bool>,
}

/// Screening question facts needed to validate submitted answers.
#[derive(Debug, FromRow)]
struct ScreeningQuestion {
    id: Uuid,
    question_text: String,
    is_required: bool,
}

/// Checks the submitted answers against the job's screening questions and
/// returns the answers to store, trimmed and with blanks dropped.
fn check_answers(
    questions: &[ScreeningQuestion],
    answers: &[AnswerInput],
) -> Result<Vec<(Uuid, String)>, AppError> {
    let known: HashSet<Uuid> = questions.iter().map(|q| q.id).collect();
    if let Some(unknown) = answers.iter().find(|a| !known.contains(&a.question_id)) {
        return Err(AppError::Validation(format!(
            "Question {} does not belong to this job",
            unknown.question_id
        )));
    }

    let mut by_question: HashMap<Uuid, String> = HashMap::new();
    for answer in answers {
        let text = answer.answer.trim();
        if !text.is_empty() {
            by_question.insert(answer.question_id, text.to_string());
        }
    }

    let missing: Vec<&str> = questions
        .iter()
        .filter(|q| q.is_required && !by_question.contains_key(&q.id))
        .map(|q| q.question_text.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Please answer all required questions: {}",
            missing.join("; ")
        )));
    }

    Ok(questions
        .iter()
        .filter_map(|q| by_question.remove(&q.id).map(|a| (q.id, a)))
        .collect())
}

pub(crate) fn status_message(status: ApplicationStatus, job_title: &str) -> String {
    match status {
        ApplicationStatus::Applied => format!("Your application for {job_title} is under review."),
        ApplicationStatus::Shortlisted => {
            format!("You have been shortlisted for {job_title}.")
        }
        ApplicationStatus::Interview => {
            format!("You have been invited to interview for {job_title}.")
        }
        ApplicationStatus::Rejected => {
            format!("Your application for {job_title} was not taken forward.")
        }
        ApplicationStatus::Hired => format!("Congratulations! You have been hired as {job_title}."),
    }
}

struct NewApplication<'a> {
    id: Uuid,
    job_id: i64,
    candidate_id: Uuid,
    company_id: Uuid,
    resume_id: Uuid,
    resume_name: &'a str,
    resume_key: &'a str,
}

/// Inserts the application with its screening answers in one transaction.
async fn record_application(
    state: &AppState,
    application: NewApplication<'_>,
    answers: &[(Uuid, String)],
) -> Result<(), AppError> {
    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO job_applications
            (id, job_id, candidate_id, company_id, resume_id, resume_name, resume_key, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'applied')
        "#,
    )
    .bind(application.id)
    .bind(application.job_id)
    .bind(application.candidate_id)
    .bind(application.company_id)
    .bind(application.resume_id)
    .bind(application.resume_name)
    .bind(application.resume_key)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("You have already applied to this job".into())
        } else {
            e.into()
        }
    })?;

    for (question_id, answer) in answers {
        sqlx::query(
            "INSERT INTO job_application_answers (application_id, question_id, answer) VALUES ($1, $2, $3)",
        )
        .bind(application.id)
        .bind(question_id)
        .bind(answer)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// POST /api/jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(job_id): Path<i64>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplyResponse>), AppError> {
    let resume_id = req
        .resume_id
        .ok_or_else(|| AppError::Validation("Resume is required".into()))?;

    let candidate_id = find_candidate_id(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Candidate profile not found".into()))?;

    let resume: Option<(String, String)> = sqlx::query_as(
        "SELECT resume_name, storage_key FROM candidate_resumes WHERE id = $1 AND candidate_id = $2",
    )
    .bind(resume_id)
    .bind(candidate_id)
    .fetch_optional(&state.db)
    .await?;
    let (resume_name, source_key) =
        resume.ok_or_else(|| AppError::Validation("Invalid resume selected".into()))?;

    let job: Option<(Uuid, String, String)> = sqlx::query_as(
        "SELECT company_id, status, job_title FROM job_postings WHERE job_id = $1 AND status <> 'deleted'",
    )
    .bind(job_id)
    .fetch_optional(&state.db)
    .await?;
    let (company_id, status, job_title) =
        job.ok_or_else(|| AppError::NotFound("Job not found".into()))?;
    if status != JobStatus::Open.as_str() {
        return Err(AppError::Validation(
            "This job is no longer accepting applications".into(),
        ));
    }

    let questions = sqlx::query_as::<_, ScreeningQuestion>(
        "SELECT id, question_text, is_required FROM job_questions WHERE job_id = $1 ORDER BY question_order",
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;
    let answers = check_answers(&questions, &req.answers)?;

    let already: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM job_applications WHERE job_id = $1 AND candidate_id = $2",
    )
    .bind(job_id)
    .bind(candidate_id)
    .fetch_optional(&state.db)
    .await?;
    if already.is_some() {
        return Err(AppError::Conflict("You have already applied to this job".into()));
    }

    // The snapshot outlives edits or deletion of the library resume.
    let application_id = Uuid::new_v4();
    let snapshot_key = application_resume_key(application_id);
    state.store.copy(&source_key, &snapshot_key).await?;

    let application = NewApplication {
        id: application_id,
        job_id,
        candidate_id,
        company_id,
        resume_id,
        resume_name: &resume_name,
        resume_key: &snapshot_key,
    };
    let recorded = record_application(&state, application, &answers).await;
    state
        .store
        .discard_on_error(&snapshot_key, recorded)
        .await?;

    info!("Candidate {candidate_id} applied to job {job_id} ({job_title})");
    Ok((
        StatusCode::CREATED,
        Json(ApplyResponse {
            message: "Application submitted successfully",
            application_id,
        }),
    ))
}

/// GET /api/applications/my-applications
pub async fn handle_my_applications(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
) -> Result<Json<ListResponse<MyApplicationRow>>, AppError> {
    let Some(candidate_id) = find_candidate_id(&state.db, user.id).await? else {
        return Ok(Json(Vec::new().into()));
    };

    let rows = sqlx::query_as::<_, MyApplicationRow>(
        r#"
        SELECT ja.id, ja.job_id, jp.job_title, c.name AS company_name, jp.location,
               jp.job_type, ja.status, ja.applied_at, ja.resume_name,
               ja.test_id, ja.test_status, ja.test_score
        FROM job_applications ja
        JOIN job_postings jp ON jp.job_id = ja.job_id
        JOIN companies c ON c.id = ja.company_id
        WHERE ja.candidate_id = $1
        ORDER BY ja.applied_at DESC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into()))
}

/// GET /api/recruiter/jobs/:id/applications
pub async fn handle_job_applications(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(job_id): Path<i64>,
) -> Result<Json<ListResponse<JobApplicantRow>>, AppError> {
    let owns: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT jp.job_id
        FROM job_postings jp
        JOIN companies c ON c.id = jp.company_id
        WHERE jp.job_id = $1 AND c.created_by = $2
        "#,
    )
    .bind(job_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;
    if owns.is_none() {
        return Err(AppError::Forbidden("Access denied".into()));
    }

    let rows = sqlx::query_as::<_, JobApplicantRow>(
        r#"
        SELECT ja.id, ja.status, ja.applied_at, ja.resume_id, ja.resume_name,
               c.id AS candidate_id, c.name AS candidate_name, c.email AS candidate_email,
               c.experience_years, ja.test_status, ja.test_score, ja.match_score,
               COALESCE(
                   json_agg(
                       json_build_object(
                           'question', jq.question_text,
                           'answer', jaa.answer,
                           'type', jq.question_type
                       ) ORDER BY jq.question_order
                   ) FILTER (WHERE jaa.id IS NOT NULL),
                   '[]'::json
               ) AS answers
        FROM job_applications ja
        JOIN candidates c ON c.id = ja.candidate_id
        LEFT JOIN job_application_answers jaa ON jaa.application_id = ja.id
        LEFT JOIN job_questions jq ON jq.id = jaa.question_id
        WHERE ja.job_id = $1
        GROUP BY ja.id, c.id
        ORDER BY ja.match_score DESC NULLS LAST, ja.applied_at DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into()))
}

/// GET /api/recruiter/applications
pub async fn handle_recruiter_applications(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
) -> Result<Json<ListResponse<RecruiterApplicationRow>>, AppError> {
    let rows = sqlx::query_as::<_, RecruiterApplicationRow>(
        r#"
        SELECT ja.id, ja.status, ja.applied_at, ja.job_id, jp.job_title,
               ja.resume_id, ja.resume_name,
               c.id AS candidate_id, c.name AS candidate_name, c.email AS candidate_email,
               c.experience_years AS experience, c.skills,
               ja.test_status, ja.test_score, ja.match_score
        FROM job_applications ja
        JOIN job_postings jp ON jp.job_id = ja.job_id
        JOIN companies comp ON comp.id = jp.company_id
        JOIN candidates c ON c.id = ja.candidate_id
        WHERE comp.created_by = $1
        ORDER BY ja.applied_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    info!("Found {} applications for recruiter {}", rows.len(), user.id);
    Ok(Json(rows.into()))
}

/// PATCH /api/recruiter/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(application_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let status: ApplicationStatus = req.status.trim().parse().map_err(AppError::Validation)?;

    let updated = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE job_applications ja
        SET status = $1
        FROM companies c
        WHERE ja.company_id = c.id AND c.created_by = $2 AND ja.id = $3
        RETURNING ja.*
        "#,
    )
    .bind(status.as_str())
    .bind(user.id)
    .bind(application_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Application not found or access denied".into()))?;

    info!("Application {application_id} moved to {status} by {}", user.id);

    if req.notify.unwrap_or(true) {
        let target: Option<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT cand.user_id, jp.job_title
            FROM candidates cand
            JOIN job_postings jp ON jp.job_id = $2
            WHERE cand.id = $1
            "#,
        )
        .bind(updated.candidate_id)
        .bind(updated.job_id)
        .fetch_optional(&state.db)
        .await
        .unwrap_or_else(|e| {
            warn!("Could not look up candidate for notification: {e}");
            None
        });

        if let Some((candidate_user, job_title)) = target {
            notify(
                &state.db,
                NewNotification {
                    user_id: candidate_user,
                    kind: APPLICATION_STATUS,
                    title: "Application update".to_string(),
                    message: status_message(status, &job_title),
                    metadata: json!({
                        "applicationId": application_id,
                        "jobId": updated.job_id,
                        "status": status,
                    }),
                },
            )
            .await;
        }
    }

    Ok(Json(updated))
}

/// GET /api/recruiter/applications/:id/resume
pub async fn handle_application_resume(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(application_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let found: Option<(String, String)> = sqlx::query_as(
        r#"
        SELECT ja.resume_key, ja.resume_name
        FROM job_applications ja
        JOIN job_postings jp ON jp.job_id = ja.job_id
        JOIN companies c ON c.id = jp.company_id
        WHERE ja.id = $1 AND c.created_by = $2
        "#,
    )
    .bind(application_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;
    let (key, name) =
        found.ok_or_else(|| AppError::NotFound("Application not found or unauthorized".into()))?;

    let bytes = state.store.get(&key).await?;
    Ok(inline_file(bytes, "application/pdf", &name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(n: u128, text: &str, required: bool) -> ScreeningQuestion {
        ScreeningQuestion {
            id: Uuid::from_u128(n),
            question_text: text.to_string(),
            is_required: required,
        }
    }

    fn answer(n: u128, text: &str) -> AnswerInput {
        AnswerInput {
            question_id: Uuid::from_u128(n),
            answer: text.to_string(),
        }
    }

    #[test]
    fn test_required_question_must_be_answered() {
        let questions = [question(1, "Notice period?", true), question(2, "Hobbies?", false)];
        let err = check_answers(&questions, &[answer(1, "   "), answer(2, "chess")]).unwrap_err();
        assert!(err.to_string().contains("Notice period?"));
    }

    #[test]
    fn test_optional_blank_answers_are_dropped() {
        let questions = [question(1, "Notice period?", true), question(2, "Hobbies?", false)];
        let stored = check_answers(&questions, &[answer(2, ""), answer(1, " 30 days ")]).unwrap();
        assert_eq!(stored, vec![(Uuid::from_u128(1), "30 days".to_string())]);
    }

    #[test]
    fn test_answer_to_foreign_question_rejected() {
        let questions = [question(1, "Notice period?", false)];
        assert!(check_answers(&questions, &[answer(9, "yes")]).is_err());
    }

    #[test]
    fn test_no_questions_no_answers() {
        assert!(check_answers(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_status_message_mentions_job() {
        let msg = status_message(ApplicationStatus::Interview, "Backend Engineer");
        assert!(msg.contains("Backend Engineer"));
        assert!(msg.contains("interview"));
    }
}
