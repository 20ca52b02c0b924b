//! Event feedback endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::auth::Principal;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{require_organizer, require_student},
    models::feedback::NewFeedback,
    repositories::feedback::FeedbackOutcome,
    routes::events::owned_event,
    state::AppState,
};

/// Submit feedback for an attended event
pub async fn submit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<NewFeedback>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;
    payload.validate().map_err(ApiError::Validation)?;

    state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    match state
        .feedback_repository
        .submit(event_id, principal.user_id, &principal.name, &payload)
        .await?
    {
        FeedbackOutcome::Created(feedback) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "feedback": feedback,
            })),
        )),
        FeedbackOutcome::NotAttended => Err(ApiError::Forbidden(
            "Feedback requires a checked-in registration".to_string(),
        )),
        FeedbackOutcome::Duplicate => Err(ApiError::Conflict(
            "Feedback already submitted for this event".to_string(),
        )),
    }
}

/// List feedback for an owned event with the average rating
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;
    owned_event(&state, &principal, event_id).await?;

    let (feedback, average_rating) = state.feedback_repository.list_for_event(event_id).await?;

    Ok(Json(json!({
        "success": true,
        "total": feedback.len(),
        "average_rating": average_rating,
        "feedback": feedback,
    })))
}
