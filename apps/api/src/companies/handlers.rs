use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::Recruiter;
use crate::errors::AppError;
use crate::files::{decode_data_uri, inline_file, MB};
use crate::models::company::CompanyRow;
use crate::state::AppState;
use crate::storage::logo_key;

const MAX_LOGO_BYTES: usize = 5 * MB;

#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub website_url: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    /// Image as a base64 data URI. Omit to keep the current logo.
    pub logo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyView {
    #[serde(flatten)]
    pub company: CompanyRow,
    pub logo_url: Option<String>,
}

impl From<CompanyRow> for CompanyView {
    fn from(company: CompanyRow) -> Self {
        let logo_url = company
            .logo_key
            .as_ref()
            .map(|_| format!("/api/companies/{}/logo", company.id));
        Self { company, logo_url }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub company: Option<CompanyView>,
}

/// The company owned by a recruiter, if any.
pub async fn find_company_for(
    state: &AppState,
    recruiter_id: Uuid,
) -> Result<Option<CompanyRow>, AppError> {
    Ok(
        sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE created_by = $1")
            .bind(recruiter_id)
            .fetch_optional(&state.db)
            .await?,
    )
}

/// GET /api/companies/mine
pub async fn handle_get_mine(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = find_company_for(&state, user.id).await?;
    Ok(Json(CompanyResponse {
        company: company.map(CompanyView::from),
    }))
}

/// POST /api/companies
pub async fn handle_upsert(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Json(req): Json<CompanyRequest>,
) -> Result<Json<CompanyResponse>, AppError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Company name is required".into()))?;

    let logo = match req.logo.as_deref().filter(|l| !l.trim().is_empty()) {
        Some(raw) => {
            let file = decode_data_uri(raw)?;
            let mime = file
                .mime
                .clone()
                .filter(|m| m.starts_with("image/"))
                .ok_or_else(|| AppError::Validation("Only image files are allowed".into()))?;
            if file.bytes.len() > MAX_LOGO_BYTES {
                return Err(AppError::Validation("Logo must be 5MB or smaller".into()));
            }
            Some((mime, file.bytes))
        }
        None => None,
    };

    let existing = find_company_for(&state, user.id).await?;
    let company_id = existing.as_ref().map_or_else(Uuid::new_v4, |c| c.id);

    let (logo_key_value, logo_mime) = match logo {
        Some((mime, bytes)) => {
            let key = logo_key(company_id);
            state.store.put(&key, Bytes::from(bytes), &mime).await?;
            (Some(key), Some(mime))
        }
        None => (None, None),
    };

    let company = sqlx::query_as::<_, CompanyRow>(
        r#"
        INSERT INTO companies
            (id, created_by, name, industry, website_url, location, description,
             linkedin_url, twitter_url, logo_key, logo_mime)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (created_by) DO UPDATE SET
            name = EXCLUDED.name,
            industry = EXCLUDED.industry,
            website_url = EXCLUDED.website_url,
            location = EXCLUDED.location,
            description = EXCLUDED.description,
            linkedin_url = EXCLUDED.linkedin_url,
            twitter_url = EXCLUDED.twitter_url,
            logo_key = COALESCE(EXCLUDED.logo_key, companies.logo_key),
            logo_mime = COALESCE(EXCLUDED.logo_mime, companies.logo_mime),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(company_id)
    .bind(user.id)
    .bind(name)
    .bind(&req.industry)
    .bind(&req.website_url)
    .bind(&req.location)
    .bind(&req.description)
    .bind(&req.linkedin_url)
    .bind(&req.twitter_url)
    .bind(&logo_key_value)
    .bind(&logo_mime)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Saved company {} for recruiter {} (new: {})",
        company.id,
        user.id,
        existing.is_none()
    );
    Ok(Json(CompanyResponse {
        company: Some(company.into()),
    }))
}

/// GET /api/companies/:id/logo
pub async fn handle_get_logo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let row: Option<(Option<String>, Option<String>)> =
        sqlx::query_as("SELECT logo_key, logo_mime FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;

    let Some((Some(key), mime)) = row else {
        return Err(AppError::NotFound(format!("No logo for company {id}")));
    };
    let bytes = state.store.get(&key).await?;
    let mime = mime.unwrap_or_else(|| "image/png".to_string());
    Ok(inline_file(bytes, &mime, "logo"))
}
