use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::FromRow;

use crate::auth::JobSeeker;
use crate::candidates::profile::profile_completion;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct CompletionFacts {
    experience_years: i32,
    profile_description: Option<String>,
    skills: Vec<String>,
    has_resume: bool,
    applications_sent: i64,
    interviews_scheduled: i64,
    pending_tests: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub applications_sent: i64,
    pub interviews_scheduled: i64,
    pub pending_tests: i64,
    pub profile_completion: u8,
}

impl From<CompletionFacts> for DashboardStats {
    fn from(facts: CompletionFacts) -> Self {
        Self {
            applications_sent: facts.applications_sent,
            interviews_scheduled: facts.interviews_scheduled,
            pending_tests: facts.pending_tests,
            profile_completion: profile_completion(
                facts.experience_years,
                facts.profile_description.as_deref(),
                &facts.skills,
                facts.has_resume,
            ),
        }
    }
}

/// GET /api/dashboard/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
) -> Result<Json<DashboardStats>, AppError> {
    let facts = sqlx::query_as::<_, CompletionFacts>(
        r#"
        SELECT c.experience_years, c.profile_description, c.skills,
               (c.resume_key IS NOT NULL
                OR EXISTS (SELECT 1 FROM candidate_resumes r WHERE r.candidate_id = c.id)) AS has_resume,
               (SELECT COUNT(*) FROM job_applications ja WHERE ja.candidate_id = c.id) AS applications_sent,
               (SELECT COUNT(*) FROM job_applications ja
                 WHERE ja.candidate_id = c.id AND ja.status = 'interview') AS interviews_scheduled,
               (SELECT COUNT(*) FROM job_applications ja
                 WHERE ja.candidate_id = c.id AND ja.test_status = 'pending') AS pending_tests
        FROM candidates c
        WHERE c.user_id = $1
        "#,
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Candidate profile not found".into()))?;

    Ok(Json(facts.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_facts() {
        let stats: DashboardStats = CompletionFacts {
            experience_years: 3,
            profile_description: Some("Backend developer".into()),
            skills: vec![],
            has_resume: true,
            applications_sent: 4,
            interviews_scheduled: 1,
            pending_tests: 2,
        }
        .into();
        assert_eq!(stats.profile_completion, 80);
        assert_eq!(stats.applications_sent, 4);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["interviewsScheduled"], 1);
        assert_eq!(json["profileCompletion"], 80);
    }
}
