use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::validation::{is_valid_email, require_all, validate_password};
use crate::auth::AuthUser;
use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::user::{PublicUser, UserRow};
use crate::models::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub intent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub looking_for: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<UserRow>, AppError> {
    Ok(
        sqlx::query_as::<_, UserRow>("SELECT * FROM credentials WHERE email = $1")
            .bind(email)
            .fetch_optional(&state.db)
            .await?,
    )
}

/// Inserts a credentials row. A unique violation (concurrent sign-up) maps to 400.
async fn insert_user(
    state: &AppState,
    email: &str,
    name: Option<&str>,
    password: &str,
    role: Role,
) -> Result<UserRow, AppError> {
    let password_hash = hash_password(password)?;
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO credentials (email, name, password_hash, role, is_verified)
        VALUES ($1, $2, $3, $4, FALSE)
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(name)
    .bind(&password_hash)
    .bind(role.as_str())
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email already exists".into())
        } else {
            AppError::Database(e)
        }
    })
}

fn issue_token(state: &AppState, user: &UserRow) -> Result<String, AppError> {
    let role: Role = user
        .role
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    state
        .jwt
        .issue(user.id, &user.email, role)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token signing failed: {e}")))
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    require_all(&[
        ("name", req.name.as_deref()),
        ("email", req.email.as_deref()),
        ("password", req.password.as_deref()),
        ("intent", req.intent.as_deref()),
    ])?;
    let (Some(name), Some(email), Some(password), Some(intent)) =
        (req.name, req.email, req.password, req.intent)
    else {
        return Err(AppError::Validation("Missing required fields".into()));
    };

    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    validate_password(&password)?;
    let role = Role::from_intent(&intent).ok_or_else(|| {
        AppError::Validation("Invalid intent. Must be \"job\" or \"employee\"".into())
    })?;

    if find_by_email(&state, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "Email already exists. Please use a different email or log in.".into(),
        ));
    }

    let user = insert_user(&state, &email, Some(name.trim()), &password, role).await?;
    let token = issue_token(&state, &user)?;
    info!("Registered user {} as {}", user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful",
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login
///
/// Combined login and sign-up: an unknown email creates an account with the
/// role implied by `lookingFor`, a known email must match its password.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    require_all(&[
        ("email", req.email.as_deref()),
        ("password", req.password.as_deref()),
        ("lookingFor", req.looking_for.as_deref()),
    ])?;
    let (Some(email), Some(password), Some(looking_for)) =
        (req.email, req.password, req.looking_for)
    else {
        return Err(AppError::Validation("Missing required fields".into()));
    };

    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    let role = Role::from_intent(&looking_for).ok_or_else(|| {
        AppError::Validation("Invalid lookingFor value. Must be \"job\" or \"employee\"".into())
    })?;

    let (user, status, message) = match find_by_email(&state, &email).await? {
        Some(existing) => {
            if !verify_password(&password, &existing.password_hash) {
                return Err(AppError::Unauthorized("Invalid credentials".into()));
            }
            (existing, StatusCode::OK, "Login successful")
        }
        None => {
            validate_password(&password)?;
            let created = insert_user(&state, &email, None, &password, role).await?;
            info!("Created account {} on first login", created.id);
            (created, StatusCode::CREATED, "Account created successfully")
        }
    };

    let token = issue_token(&state, &user)?;
    Ok((
        status,
        Json(AuthResponse {
            message,
            token,
            user: user.into(),
        }),
    ))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM credentials WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(MeResponse { user: row.into() }))
}
