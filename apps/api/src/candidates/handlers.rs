use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use crate::auth::JobSeeker;
use crate::candidates::dates::optional_date;
use crate::candidates::profile::{ensure_candidate, find_candidate_id, sync_primary};
use crate::errors::AppError;
use crate::files::inline_file;
use crate::models::candidate::{
    AchievementRow, CandidateRow, EducationRow, ExperienceRow, ProjectRow,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PersonalInfoInput {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub profile_description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub is_fresher: bool,
    #[serde(default)]
    pub experience_years: i32,
}

#[derive(Debug, Deserialize)]
pub struct EducationInput {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    pub grade_or_cgpa: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExperienceInput {
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub employment_type: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AchievementInput {
    pub title: Option<String>,
    pub issuer: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectInput {
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    #[serde(default)]
    pub technologies_used: Vec<String>,
    pub project_link: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SaveProfileRequest {
    #[serde(default)]
    pub personal_info: PersonalInfoInput,
    #[serde(default)]
    pub education: Vec<EducationInput>,
    #[serde(default)]
    pub experience: Vec<ExperienceInput>,
    #[serde(default)]
    pub achievements: Vec<AchievementInput>,
    #[serde(default)]
    pub projects: Vec<ProjectInput>,
}

/// Either the stored profile or a blank form pre-filled from the account.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PersonalInfo {
    Stored(Box<CandidateRow>),
    Prefill {
        name: String,
        email: String,
        skills: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub personal_info: PersonalInfo,
    pub has_resume: bool,
    pub education: Vec<EducationRow>,
    pub experience: Vec<ExperienceRow>,
    pub achievements: Vec<AchievementRow>,
    pub projects: Vec<ProjectRow>,
}

#[derive(Debug, Serialize)]
pub struct SaveProfileResponse {
    pub candidate_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FresherStatus {
    pub is_fresher: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: Uuid,
}

fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{what} is required")))
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// GET /api/candidates/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
) -> Result<Json<ProfileResponse>, AppError> {
    let candidate = sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;

    let Some(candidate) = candidate else {
        let (name, email): (Option<String>, String) =
            sqlx::query_as("SELECT name, email FROM credentials WHERE id = $1")
                .bind(user.id)
                .fetch_optional(&state.db)
                .await?
                .unwrap_or((None, user.email.clone()));
        return Ok(Json(ProfileResponse {
            personal_info: PersonalInfo::Prefill {
                name: name.unwrap_or_default(),
                email,
                skills: Vec::new(),
            },
            has_resume: false,
            education: Vec::new(),
            experience: Vec::new(),
            achievements: Vec::new(),
            projects: Vec::new(),
        }));
    };

    let id = candidate.id;
    let (education, experience, achievements, projects) = tokio::try_join!(
        sqlx::query_as::<_, EducationRow>(
            "SELECT * FROM candidate_education WHERE candidate_id = $1 ORDER BY end_date DESC NULLS FIRST"
        )
        .bind(id)
        .fetch_all(&state.db),
        sqlx::query_as::<_, ExperienceRow>(
            "SELECT * FROM candidate_experience WHERE candidate_id = $1 ORDER BY is_current DESC, end_date DESC NULLS FIRST"
        )
        .bind(id)
        .fetch_all(&state.db),
        sqlx::query_as::<_, AchievementRow>(
            "SELECT * FROM candidate_achievements WHERE candidate_id = $1 ORDER BY date DESC NULLS LAST"
        )
        .bind(id)
        .fetch_all(&state.db),
        sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM candidate_projects WHERE candidate_id = $1 ORDER BY start_date DESC NULLS LAST"
        )
        .bind(id)
        .fetch_all(&state.db),
    )?;

    Ok(Json(ProfileResponse {
        has_resume: candidate.resume_key.is_some(),
        personal_info: PersonalInfo::Stored(Box::new(candidate)),
        education,
        experience,
        achievements,
        projects,
    }))
}

/// POST /api/candidates/profile
///
/// Saves the whole profile at once: core fields are overwritten and each
/// detail list replaces what was stored before.
pub async fn handle_save_profile(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Json(req): Json<SaveProfileRequest>,
) -> Result<Json<SaveProfileResponse>, AppError> {
    let info = &req.personal_info;
    let name = required(&info.name, "Name")?;
    if info.experience_years < 0 {
        return Err(AppError::Validation(
            "experience_years cannot be negative".into(),
        ));
    }

    let mut tx = state.db.begin().await?;
    let candidate_id = ensure_candidate(&mut tx, user.id, Some(name)).await?;

    sqlx::query(
        r#"
        UPDATE candidates SET
            name = $2,
            phone_number = $3,
            location = $4,
            github_url = $5,
            linkedin_url = $6,
            portfolio_url = $7,
            is_fresher = $8,
            experience_years = $9,
            skills = $10,
            profile_description = $11,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(candidate_id)
    .bind(name)
    .bind(&info.phone_number)
    .bind(&info.location)
    .bind(&info.github_url)
    .bind(&info.linkedin_url)
    .bind(&info.portfolio_url)
    .bind(info.is_fresher)
    .bind(info.experience_years)
    .bind(clean_list(&info.skills))
    .bind(&info.profile_description)
    .execute(&mut *tx)
    .await?;

    for table in [
        "candidate_education",
        "candidate_experience",
        "candidate_achievements",
        "candidate_projects",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE candidate_id = $1"))
            .bind(candidate_id)
            .execute(&mut *tx)
            .await?;
    }
    for entry in &req.education {
        insert_education(&mut tx, candidate_id, entry).await?;
    }
    for entry in &req.experience {
        insert_experience(&mut tx, candidate_id, entry).await?;
    }
    for entry in &req.achievements {
        insert_achievement(&mut tx, candidate_id, entry).await?;
    }
    for entry in &req.projects {
        insert_project(&mut tx, candidate_id, entry).await?;
    }

    sync_primary(&mut tx, candidate_id).await?;
    tx.commit().await?;

    info!(
        "Saved profile for candidate {candidate_id}: {} education, {} experience, {} achievements, {} projects",
        req.education.len(),
        req.experience.len(),
        req.achievements.len(),
        req.projects.len()
    );
    Ok(Json(SaveProfileResponse { candidate_id }))
}

pub(crate) async fn insert_education(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    e: &EducationInput,
) -> Result<EducationRow, AppError> {
    let institution = required(&e.institution, "Education institution")?;
    Ok(sqlx::query_as::<_, EducationRow>(
        r#"
        INSERT INTO candidate_education
            (candidate_id, institution, degree, field_of_study, start_date, end_date,
             grade_or_cgpa, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(candidate_id)
    .bind(institution)
    .bind(&e.degree)
    .bind(&e.field_of_study)
    .bind(e.start_date)
    .bind(e.end_date)
    .bind(&e.grade_or_cgpa)
    .bind(&e.description)
    .fetch_one(&mut *conn)
    .await?)
}

pub(crate) async fn insert_experience(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    e: &ExperienceInput,
) -> Result<ExperienceRow, AppError> {
    let company = required(&e.company_name, "Experience company name")?;
    let title = required(&e.job_title, "Experience job title")?;
    Ok(sqlx::query_as::<_, ExperienceRow>(
        r#"
        INSERT INTO candidate_experience
            (candidate_id, company_name, job_title, employment_type, location,
             start_date, end_date, is_current, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(candidate_id)
    .bind(company)
    .bind(title)
    .bind(&e.employment_type)
    .bind(&e.location)
    .bind(e.start_date)
    .bind(e.end_date)
    .bind(e.is_current)
    .bind(&e.description)
    .fetch_one(&mut *conn)
    .await?)
}

pub(crate) async fn insert_achievement(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    a: &AchievementInput,
) -> Result<AchievementRow, AppError> {
    let title = required(&a.title, "Achievement title")?;
    Ok(sqlx::query_as::<_, AchievementRow>(
        r#"
        INSERT INTO candidate_achievements (candidate_id, title, issuer, date, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(candidate_id)
    .bind(title)
    .bind(&a.issuer)
    .bind(a.date)
    .bind(&a.description)
    .fetch_one(&mut *conn)
    .await?)
}

pub(crate) async fn insert_project(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    p: &ProjectInput,
) -> Result<ProjectRow, AppError> {
    let title = required(&p.project_title, "Project title")?;
    Ok(sqlx::query_as::<_, ProjectRow>(
        r#"
        INSERT INTO candidate_projects
            (candidate_id, project_title, project_description, technologies_used,
             project_link, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(candidate_id)
    .bind(title)
    .bind(&p.project_description)
    .bind(clean_list(&p.technologies_used))
    .bind(&p.project_link)
    .bind(p.start_date)
    .bind(p.end_date)
    .fetch_one(&mut *conn)
    .await?)
}

async fn require_candidate(state: &AppState, user_id: Uuid) -> Result<Uuid, AppError> {
    find_candidate_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))
}

/// POST /api/candidates/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Json(req): Json<EducationInput>,
) -> Result<Json<EducationRow>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;
    let mut tx = state.db.begin().await?;
    let row = insert_education(&mut tx, candidate_id, &req).await?;
    sync_primary(&mut tx, candidate_id).await?;
    tx.commit().await?;
    Ok(Json(row))
}

/// POST /api/candidates/experience
pub async fn handle_add_experience(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Json(req): Json<ExperienceInput>,
) -> Result<Json<ExperienceRow>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;
    let mut tx = state.db.begin().await?;
    let row = insert_experience(&mut tx, candidate_id, &req).await?;
    sync_primary(&mut tx, candidate_id).await?;
    tx.commit().await?;
    Ok(Json(row))
}

/// POST /api/candidates/achievements
pub async fn handle_add_achievement(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Json(req): Json<AchievementInput>,
) -> Result<Json<AchievementRow>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;
    let mut conn = state.db.acquire().await?;
    Ok(Json(insert_achievement(&mut conn, candidate_id, &req).await?))
}

/// POST /api/candidates/projects
pub async fn handle_add_project(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Json(req): Json<ProjectInput>,
) -> Result<Json<ProjectRow>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;
    let mut conn = state.db.acquire().await?;
    Ok(Json(insert_project(&mut conn, candidate_id, &req).await?))
}

/// Detail tables that can be edited entry by entry.
#[derive(Debug, Clone, Copy)]
enum DetailTable {
    Education,
    Experience,
    Achievements,
    Projects,
}

impl DetailTable {
    fn table(self) -> &'static str {
        match self {
            DetailTable::Education => "candidate_education",
            DetailTable::Experience => "candidate_experience",
            DetailTable::Achievements => "candidate_achievements",
            DetailTable::Projects => "candidate_projects",
        }
    }

    fn feeds_primary(self) -> bool {
        matches!(self, DetailTable::Education | DetailTable::Experience)
    }
}

async fn remove_entry(
    state: &AppState,
    user_id: Uuid,
    entry_id: Uuid,
    detail: DetailTable,
) -> Result<Json<DeletedResponse>, AppError> {
    let candidate_id = require_candidate(state, user_id).await?;
    let mut tx = state.db.begin().await?;

    let deleted = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = $1 AND candidate_id = $2",
        detail.table()
    ))
    .bind(entry_id)
    .bind(candidate_id)
    .execute(&mut *tx)
    .await?;
    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    if detail.feeds_primary() {
        sync_primary(&mut tx, candidate_id).await?;
    }
    tx.commit().await?;
    Ok(Json(DeletedResponse { deleted: entry_id }))
}

/// DELETE /api/candidates/education/:id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    remove_entry(&state, user.id, id, DetailTable::Education).await
}

/// DELETE /api/candidates/experience/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    remove_entry(&state, user.id, id, DetailTable::Experience).await
}

/// DELETE /api/candidates/achievements/:id
pub async fn handle_delete_achievement(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    remove_entry(&state, user.id, id, DetailTable::Achievements).await
}

/// DELETE /api/candidates/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    remove_entry(&state, user.id, id, DetailTable::Projects).await
}

/// PATCH /api/candidates/fresher-status
pub async fn handle_set_fresher_status(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Json(req): Json<FresherStatus>,
) -> Result<Json<FresherStatus>, AppError> {
    let updated = sqlx::query(
        "UPDATE candidates SET is_fresher = $1, updated_at = NOW() WHERE user_id = $2",
    )
    .bind(req.is_fresher)
    .bind(user.id)
    .execute(&state.db)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("Profile not found".into()));
    }
    Ok(Json(req))
}

/// GET /api/candidates/resume
pub async fn handle_get_profile_resume(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
) -> Result<Response, AppError> {
    let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT name, resume_key, resume_mime FROM candidates WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    let Some((name, Some(key), mime)) = row else {
        return Err(AppError::NotFound("Resume not found".into()));
    };
    let bytes = state.store.get(&key).await?;
    let mime = mime.unwrap_or_else(|| "application/pdf".to_string());
    let extension = key.rsplit('.').next().unwrap_or("pdf");
    Ok(inline_file(bytes, &mime, &format!("{name}_resume.{extension}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_list_drops_blanks() {
        let skills = vec![" Rust ".to_string(), "".to_string(), "SQL".to_string()];
        assert_eq!(clean_list(&skills), vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_save_request_tolerates_missing_sections() {
        let req: SaveProfileRequest =
            serde_json::from_str(r#"{"personal_info": {"name": "Asha"}}"#).unwrap();
        assert_eq!(req.personal_info.name.as_deref(), Some("Asha"));
        assert!(req.education.is_empty());
        assert_eq!(req.personal_info.experience_years, 0);
    }

    #[test]
    fn test_education_dates_accept_blank() {
        let e: EducationInput = serde_json::from_str(
            r#"{"institution": "IIT", "start_date": "2018-07", "end_date": ""}"#,
        )
        .unwrap();
        assert!(e.start_date.is_some());
        assert!(e.end_date.is_none());
    }

    #[test]
    fn test_prefill_serializes_flat() {
        let info = PersonalInfo::Prefill {
            name: "".into(),
            email: "a@b.co".into(),
            skills: vec![],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["email"], "a@b.co");
    }
}
