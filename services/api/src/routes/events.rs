//! Event CRUD endpoints
//!
//! The listing and single-event read are public and only ever expose
//! published events. Everything else requires the organizer role, and
//! mutation additionally requires ownership of the event.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::auth::Principal;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::require_organizer,
    models::{
        Event, EventStatus,
        event::{EventQuery, NewEvent, UpdateEvent},
    },
    state::AppState,
};

fn validate_new_event(payload: &NewEvent) -> Result<(), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("Title must not be empty".to_string()));
    }
    if payload.venue.trim().is_empty() {
        return Err(ApiError::Validation("Venue must not be empty".to_string()));
    }
    if payload.capacity <= 0 {
        return Err(ApiError::Validation(
            "Capacity must be a positive integer".to_string(),
        ));
    }
    if let Some(ends_at) = payload.ends_at {
        if ends_at <= payload.starts_at {
            return Err(ApiError::Validation(
                "End time must be after the start time".to_string(),
            ));
        }
    }
    Ok(())
}

/// Fetch an event and require the principal to own it
pub(crate) async fn owned_event(
    state: &AppState,
    principal: &Principal,
    event_id: Uuid,
) -> Result<Event, ApiError> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if event.organizer_id != principal.user_id {
        return Err(ApiError::Forbidden(
            "You do not organize this event".to_string(),
        ));
    }

    Ok(event)
}

/// Public listing of published events
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (events, total) = state.event_repository.list_published(&query).await?;

    Ok(Json(json!({
        "success": true,
        "events": events,
        "total": total,
        "page": query.page.unwrap_or(1).max(1),
        "limit": query.limit.unwrap_or(10).clamp(1, 100),
    })))
}

/// Public single-event read; drafts and cancelled events stay hidden
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .filter(|event| event.status == EventStatus::Published)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "event": event,
        "seats_remaining": event.seats_remaining(),
    })))
}

/// Create an event owned by the authenticated organizer
pub async fn create_event(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;
    validate_new_event(&payload)?;

    let event = state
        .event_repository
        .create(principal.user_id, &payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "event": event,
        })),
    ))
}

/// List every event owned by the authenticated organizer, drafts included
pub async fn my_events(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;

    let events = state
        .event_repository
        .list_by_organizer(principal.user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "events": events,
    })))
}

/// Update an event's fields
pub async fn update_event(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<UpdateEvent>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;
    let event = owned_event(&state, &principal, event_id).await?;

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title must not be empty".to_string()));
        }
    }
    if let Some(capacity) = payload.capacity {
        if capacity <= 0 {
            return Err(ApiError::Validation(
                "Capacity must be a positive integer".to_string(),
            ));
        }
        // Shrinking below the live registration count would break the
        // counter invariant.
        if capacity < event.registered_count {
            return Err(ApiError::Validation(format!(
                "Capacity cannot drop below the {} existing registrations",
                event.registered_count
            )));
        }
    }

    let event = state
        .event_repository
        .update(event_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    info!("Event {} updated by {}", event_id, principal.user_id);

    Ok(Json(json!({
        "success": true,
        "event": event,
    })))
}

/// Delete an event; its registrations cascade at the storage layer
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;
    owned_event(&state, &principal, event_id).await?;

    let deleted = state.event_repository.delete(event_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    info!("Event {} deleted by {}", event_id, principal.user_id);

    Ok(Json(json!({
        "success": true,
        "message": "Event deleted",
    })))
}
