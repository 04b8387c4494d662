use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub industry: Option<String>,
    pub website_url: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    #[serde(skip)]
    pub logo_key: Option<String>,
    #[serde(skip)]
    pub logo_mime: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
