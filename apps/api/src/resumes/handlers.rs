use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::JobSeeker;
use crate::candidates::profile::{ensure_candidate, find_candidate_id};
use crate::errors::AppError;
use crate::files::{decode_data_uri, inline_file, MB};
use crate::models::candidate::ResumeRow;
use crate::resumes::extract::{extract_text, ResumeFormat};
use crate::resumes::parser::{parse_resume_text, save_parsed_resume, ParsedResume, StoredResume};
use crate::state::AppState;
use crate::storage::{profile_resume_key, resume_key};

pub const MAX_RESUMES: i64 = 5;
const MAX_LIBRARY_FILE_BYTES: usize = 10 * MB;
const MAX_PARSE_FILE_BYTES: usize = 5 * MB;
const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Serialize)]
pub struct ResumeListResponse {
    pub count: usize,
    pub data: Vec<ResumeRow>,
}

#[derive(Debug, Deserialize)]
pub struct UploadResumeRequest {
    pub resume_name: Option<String>,
    pub file_data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    #[serde(default)]
    pub sync_profile: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResumeResponse {
    pub message: &'static str,
    pub saved: bool,
    pub data: ParsedResume,
}

/// A resume becomes the default when it is the first one or when the upload
/// asks to replace the profile resume.
fn becomes_default(existing: i64, sync_profile: bool) -> bool {
    existing == 0 || sync_profile
}

/// GET /api/candidate/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
) -> Result<Json<ResumeListResponse>, AppError> {
    let Some(candidate_id) = find_candidate_id(&state.db, user.id).await? else {
        return Ok(Json(ResumeListResponse {
            count: 0,
            data: Vec::new(),
        }));
    };

    let resumes = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM candidate_resumes WHERE candidate_id = $1 ORDER BY created_at DESC",
    )
    .bind(candidate_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ResumeListResponse {
        count: resumes.len(),
        data: resumes,
    }))
}

/// POST /api/candidate/resumes
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Query(query): Query<UploadQuery>,
    Json(req): Json<UploadResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let (Some(resume_name), Some(file_data)) = (
        req.resume_name.as_deref().map(str::trim).filter(|n| !n.is_empty()),
        req.file_data.as_deref().filter(|d| !d.trim().is_empty()),
    ) else {
        return Err(AppError::Validation(
            "resume_name and file_data are required".into(),
        ));
    };

    let file = decode_data_uri(file_data)?;
    let mime = file.mime.as_deref().unwrap_or(PDF_MIME);
    if mime != PDF_MIME {
        return Err(AppError::Validation("Only PDF files are allowed".into()));
    }
    if file.bytes.len() > MAX_LIBRARY_FILE_BYTES {
        return Err(AppError::Validation(
            "Resume file size must be less than 10MB".into(),
        ));
    }

    let mut tx = state.db.begin().await?;
    let candidate_id = ensure_candidate(&mut tx, user.id, None).await?;

    // Serializes concurrent uploads for the same candidate so the cap holds
    sqlx::query("SELECT id FROM candidates WHERE id = $1 FOR UPDATE")
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;
    let (existing,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM candidate_resumes WHERE candidate_id = $1")
            .bind(candidate_id)
            .fetch_one(&mut *tx)
            .await?;
    if existing >= MAX_RESUMES {
        return Err(AppError::Validation(format!(
            "You can upload a maximum of {MAX_RESUMES} resumes. Please delete an existing resume before uploading a new one."
        )));
    }

    let resume_id = Uuid::new_v4();
    let key = resume_key(candidate_id, resume_id);
    let size_kb = file.size_kb();
    state.store.put(&key, Bytes::from(file.bytes), PDF_MIME).await?;

    let is_default = becomes_default(existing, query.sync_profile);
    let stored = NewResume {
        id: resume_id,
        candidate_id,
        name: resume_name,
        key: &key,
        size_kb,
        is_default,
        sync_profile: query.sync_profile,
    };
    let resume = state
        .store
        .discard_on_error(&key, record_resume(tx, stored).await)
        .await?;

    info!(
        "Stored resume {resume_id} ({size_kb} KB) for candidate {candidate_id}, default: {is_default}"
    );
    Ok((StatusCode::CREATED, Json(resume)))
}

struct NewResume<'a> {
    id: Uuid,
    candidate_id: Uuid,
    name: &'a str,
    key: &'a str,
    size_kb: i32,
    is_default: bool,
    sync_profile: bool,
}

/// Writes the library row for an already stored object and commits.
async fn record_resume(
    mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
    resume: NewResume<'_>,
) -> Result<ResumeRow, AppError> {
    if resume.is_default {
        sqlx::query("UPDATE candidate_resumes SET is_default = FALSE WHERE candidate_id = $1")
            .bind(resume.candidate_id)
            .execute(&mut *tx)
            .await?;
    }

    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO candidate_resumes
            (id, candidate_id, resume_name, storage_key, file_size_kb, mime_type, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(resume.id)
    .bind(resume.candidate_id)
    .bind(resume.name)
    .bind(resume.key)
    .bind(resume.size_kb)
    .bind(PDF_MIME)
    .bind(resume.is_default)
    .fetch_one(&mut *tx)
    .await?;

    if resume.sync_profile {
        point_profile_at(&mut tx, resume.candidate_id, resume.key).await?;
    }
    tx.commit().await?;
    Ok(row)
}

async fn point_profile_at(
    conn: &mut sqlx::PgConnection,
    candidate_id: Uuid,
    key: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE candidates SET resume_key = $1, resume_mime = $2, updated_at = NOW() WHERE id = $3",
    )
    .bind(key)
    .bind(PDF_MIME)
    .bind(candidate_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn require_candidate(state: &AppState, user_id: Uuid) -> Result<Uuid, AppError> {
    find_candidate_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Candidate profile not found".into()))
}

async fn find_resume(
    state: &AppState,
    candidate_id: Uuid,
    resume_id: Uuid,
) -> Result<ResumeRow, AppError> {
    sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM candidate_resumes WHERE id = $1 AND candidate_id = $2",
    )
    .bind(resume_id)
    .bind(candidate_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Resume not found".into()))
}

/// GET /api/candidate/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(resume_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;
    let resume = find_resume(&state, candidate_id, resume_id).await?;
    let bytes = state.store.get(&resume.storage_key).await?;
    Ok(inline_file(bytes, &resume.mime_type, &resume.resume_name))
}

/// DELETE /api/candidate/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;

    let mut tx = state.db.begin().await?;
    let deleted: Option<(String,)> = sqlx::query_as(
        "DELETE FROM candidate_resumes WHERE id = $1 AND candidate_id = $2 RETURNING storage_key",
    )
    .bind(resume_id)
    .bind(candidate_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((key,)) = deleted else {
        return Err(AppError::NotFound("Resume not found".into()));
    };

    // The profile must not keep pointing at a removed object
    sqlx::query(
        "UPDATE candidates SET resume_key = NULL, resume_mime = NULL WHERE id = $1 AND resume_key = $2",
    )
    .bind(candidate_id)
    .bind(&key)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    // Applications keep their own copy, so a failed delete only leaks storage
    if let Err(e) = state.store.delete(&key).await {
        warn!("Resume {resume_id} removed but object cleanup failed: {e}");
    }

    Ok(Json(MessageResponse {
        message: "Resume deleted successfully".into(),
    }))
}

/// PATCH /api/candidate/resumes/:id/set-default
pub async fn handle_set_default_resume(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;
    let resume = find_resume(&state, candidate_id, resume_id).await?;

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        UPDATE candidate_resumes
        SET is_default = (id = $1), updated_at = NOW()
        WHERE candidate_id = $2
        "#,
    )
    .bind(resume_id)
    .bind(candidate_id)
    .execute(&mut *tx)
    .await?;
    point_profile_at(&mut tx, candidate_id, &resume.storage_key).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse {
        message: format!("{} set as default resume", resume.resume_name),
    }))
}

/// The `resume` file and `autoSave` flag of a parse request.
struct ParseUpload {
    bytes: Bytes,
    format: ResumeFormat,
    auto_save: bool,
}

async fn read_parse_upload(mut multipart: Multipart) -> Result<ParseUpload, AppError> {
    let mut file: Option<(Bytes, ResumeFormat)> = None;
    let mut auto_save = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let format = ResumeFormat::detect(field.content_type(), field.file_name())
                    .ok_or_else(|| {
                        AppError::Validation("Only PDF and DOCX files are allowed".into())
                    })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
                file = Some((bytes, format));
            }
            Some("autoSave") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid autoSave field: {e}")))?;
                auto_save = value.trim() == "true";
            }
            _ => {}
        }
    }

    let (bytes, format) =
        file.ok_or_else(|| AppError::Validation("No resume file uploaded".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }
    if bytes.len() > MAX_PARSE_FILE_BYTES {
        return Err(AppError::Validation("Resume must be 5MB or smaller".into()));
    }
    Ok(ParseUpload {
        bytes,
        format,
        auto_save,
    })
}

/// POST /api/candidates/parse-resume
///
/// Extracts text, asks the model for structured data once, and with
/// `autoSave=true` merges the result into the caller's profile.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    state
        .rate_limiter
        .check("parse_resume", user.id, state.config.parse_rate_limit_per_hour)
        .await?;

    let upload = read_parse_upload(multipart).await?;
    let text = extract_text(upload.bytes.clone(), upload.format)
        .await
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read resume: {e}")))?;
    let parsed = parse_resume_text(&state.llm, text).await?;

    if !upload.auto_save {
        return Ok(Json(ParseResumeResponse {
            message: "Resume parsed successfully",
            saved: false,
            data: parsed,
        }));
    }

    let mut tx = state.db.begin().await?;
    let candidate_id = ensure_candidate(&mut tx, user.id, parsed.personal_info.name.as_deref()).await?;
    let key = profile_resume_key(candidate_id, upload.format.extension());
    state
        .store
        .put(&key, upload.bytes, upload.format.mime())
        .await?;
    save_parsed_resume(
        &mut tx,
        candidate_id,
        &parsed,
        StoredResume {
            key: &key,
            mime: upload.format.mime(),
        },
    )
    .await?;
    tx.commit().await?;

    Ok(Json(ParseResumeResponse {
        message: "Resume parsed and saved successfully",
        saved: true,
        data: parsed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection() {
        assert!(becomes_default(0, false));
        assert!(becomes_default(3, true));
        assert!(!becomes_default(1, false));
    }

    #[test]
    fn test_upload_query_parsing() {
        assert!(upload_query("syncProfile=true").sync_profile);
        assert!(!upload_query("syncProfile=false").sync_profile);
        assert!(!upload_query("").sync_profile);
    }

    fn upload_query(raw: &str) -> UploadQuery {
        let uri: axum::http::Uri = format!("/x?{raw}").parse().unwrap();
        Query::<UploadQuery>::try_from_uri(&uri).unwrap().0
    }
}
