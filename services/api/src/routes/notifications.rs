//! Notification inbox endpoints; every operation is owner-scoped

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use common::auth::Principal;
use serde_json::json;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// List the authenticated user's notifications, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let (notifications, unread_count) = state
        .notification_repository
        .list_for_user(principal.user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "unread_count": unread_count,
        "notifications": notifications,
    })))
}

/// Mark one notification read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .notification_repository
        .mark_read(notification_id, principal.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "notification": notification,
    })))
}

/// Mark every unread notification read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .notification_repository
        .mark_all_read(principal.user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "updated": updated,
    })))
}

/// Delete one notification
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .notification_repository
        .delete(notification_id, principal.user_id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Notification deleted",
    })))
}
