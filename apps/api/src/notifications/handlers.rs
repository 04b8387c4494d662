use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::notification::NotificationRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub unread: i64,
    pub data: Vec<NotificationRow>,
}

/// GET /api/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<NotificationListResponse>, AppError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT 100",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    // Counted over every notification, not just the page returned.
    let unread: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(NotificationListResponse { unread, data: rows }))
}

/// PATCH /api/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationRow>, AppError> {
    sqlx::query_as::<_, NotificationRow>(
        "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("Notification not found".into()))
}
