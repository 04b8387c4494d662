use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Role;
use crate::state::AppState;

/// Any authenticated caller, taken from a `Bearer` access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// An authenticated caller with the `recruiter` role.
#[derive(Debug, Clone)]
pub struct Recruiter(pub AuthUser);

/// An authenticated caller with the `job_seeker` role.
#[derive(Debug, Clone)]
pub struct JobSeeker(pub AuthUser);

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| {
                AppError::Unauthorized("No token provided. Authentication required.".into())
            })?;

        let claims = state.jwt.verify(token).map_err(|e| {
            debug!("Rejected access token: {e}");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token expired. Please log in again.".into())
                }
                _ => AppError::Unauthorized("Invalid token. Please log in again.".into()),
            }
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Recruiter {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Recruiter {
            return Err(AppError::Forbidden(
                "Access denied. Recruiter role required.".into(),
            ));
        }
        Ok(Recruiter(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for JobSeeker {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::JobSeeker {
            return Err(AppError::Forbidden(
                "Access denied. Job seeker role required.".into(),
            ));
        }
        Ok(JobSeeker(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
