use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::handlers::status_message;
use crate::applications::matching::{
    candidate_text, explain, job_text, match_score, pick_shortlist, MatchExplanation,
};
use crate::auth::Recruiter;
use crate::errors::AppError;
use crate::models::ApplicationStatus;
use crate::notifications::{notify_all, NewNotification, APPLICATION_STATUS};
use crate::resumes::extract::{extract_text, ResumeFormat};
use crate::state::AppState;

/// How many of the best matches are promoted when the request does not say.
const DEFAULT_SHORTLIST_SIZE: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ShortlistRequest {
    /// Number of top-ranked applicants to mark `shortlisted`; 0 only scores.
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RankedApplicant {
    pub application_id: Uuid,
    pub candidate_name: String,
    pub match_score: i32,
    pub shortlisted: bool,
    pub explanation: MatchExplanation,
}

#[derive(Debug, Serialize)]
pub struct ShortlistResponse {
    pub message: String,
    pub shortlisted: usize,
    pub data: Vec<RankedApplicant>,
}

#[derive(Debug, FromRow)]
struct JobCriteria {
    job_title: String,
    job_description: String,
    required_skills: String,
}

#[derive(Debug, FromRow)]
struct Applicant {
    id: Uuid,
    status: String,
    resume_key: String,
    user_id: Uuid,
    candidate_name: String,
    skills: Vec<String>,
    degree: Option<String>,
    institution: Option<String>,
}

/// Text of an application's resume snapshot. An unreadable resume scores on
/// the profile alone.
async fn snapshot_text(state: &AppState, applicant: &Applicant) -> String {
    let bytes = match state.store.get(&applicant.resume_key).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Shortlist: no resume for application {}: {e}", applicant.id);
            return String::new();
        }
    };
    extract_text(bytes, ResumeFormat::Pdf)
        .await
        .unwrap_or_else(|e| {
            warn!("Shortlist: could not read resume of application {}: {e}", applicant.id);
            String::new()
        })
}

/// POST /api/jobs/:id/shortlist
///
/// Scores every applicant against the job, stores `match_score`, and moves
/// the best `top` applicants still in `applied` to `shortlisted`.
pub async fn handle_shortlist(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(job_id): Path<i64>,
    body: Option<Json<ShortlistRequest>>,
) -> Result<Json<ShortlistResponse>, AppError> {
    let top = body
        .and_then(|Json(req)| req.top)
        .unwrap_or(DEFAULT_SHORTLIST_SIZE);

    let job = sqlx::query_as::<_, JobCriteria>(
        r#"
        SELECT jp.job_title, jp.job_description, jp.required_skills
        FROM job_postings jp
        JOIN companies c ON c.id = jp.company_id
        WHERE jp.job_id = $1 AND c.created_by = $2 AND jp.status <> 'deleted'
        "#,
    )
    .bind(job_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Forbidden("Access denied or job not found".into()))?;

    let applicants = sqlx::query_as::<_, Applicant>(
        r#"
        SELECT ja.id, ja.status, ja.resume_key,
               c.user_id, c.name AS candidate_name, c.skills, c.degree, c.institution
        FROM job_applications ja
        JOIN candidates c ON c.id = ja.candidate_id
        WHERE ja.job_id = $1
        ORDER BY ja.applied_at
        "#,
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;
    if applicants.is_empty() {
        return Err(AppError::Validation("No applicants to shortlist".into()));
    }

    let target = job_text(&job.job_description, &job.required_skills);
    let mut scored = Vec::with_capacity(applicants.len());
    for applicant in applicants {
        let resume = snapshot_text(&state, &applicant).await;
        let profile = candidate_text(
            &applicant.skills,
            applicant.degree.as_deref(),
            applicant.institution.as_deref(),
            &resume,
        );
        let score = match_score(&target, &profile);
        let explanation = explain(&job.required_skills, &applicant.skills, &profile, score);
        scored.push((applicant, score, explanation));
    }
    // Stable: equal scores keep application order.
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let ranking: Vec<(i32, bool)> = scored
        .iter()
        .map(|(a, score, _)| (*score, a.status == ApplicationStatus::Applied.as_str()))
        .collect();
    let promoted = pick_shortlist(&ranking, top);

    let mut tx = state.db.begin().await?;
    for (position, (applicant, score, _)) in scored.iter().enumerate() {
        sqlx::query(
            r#"
            UPDATE job_applications
            SET match_score = $1, shortlisted_by_ai = TRUE,
                status = CASE WHEN $3 THEN $4 ELSE status END
            WHERE id = $2
            "#,
        )
        .bind(score)
        .bind(applicant.id)
        .bind(promoted.contains(&position))
        .bind(ApplicationStatus::Shortlisted.as_str())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    let notifications = promoted
        .iter()
        .map(|&position| {
            let applicant = &scored[position].0;
            NewNotification {
                user_id: applicant.user_id,
                kind: APPLICATION_STATUS,
                title: "Application update".to_string(),
                message: status_message(ApplicationStatus::Shortlisted, &job.job_title),
                metadata: json!({
                    "applicationId": applicant.id,
                    "jobId": job_id,
                    "status": ApplicationStatus::Shortlisted,
                }),
            }
        })
        .collect();
    notify_all(&state.db, notifications).await;

    info!(
        "Ranked {} applicants for job {job_id}, shortlisted {}",
        scored.len(),
        promoted.len()
    );
    let data: Vec<RankedApplicant> = scored
        .into_iter()
        .enumerate()
        .map(|(position, (applicant, match_score, explanation))| RankedApplicant {
            application_id: applicant.id,
            candidate_name: applicant.candidate_name,
            match_score,
            shortlisted: promoted.contains(&position),
            explanation,
        })
        .collect();

    Ok(Json(ShortlistResponse {
        message: format!("Successfully ranked {} candidates", data.len()),
        shortlisted: promoted.len(),
        data,
    }))
}
