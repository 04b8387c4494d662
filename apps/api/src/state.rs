use sqlx::PgPool;

use crate::auth::jwt::JwtKeys;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::rate_limit::RateLimiter;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis-backed limiter guarding the AI endpoints.
    pub rate_limiter: RateLimiter,
    /// Resume files and company logos.
    pub store: ObjectStore,
    pub llm: LlmClient,
    pub jwt: JwtKeys,
    pub config: Config,
}
