//! Registration and check-in endpoints
//!
//! Registration, cancellation, and check-in all resolve through outcome
//! enums from the repository; the handlers translate outcomes into HTTP
//! statuses and fire the matching notifications. Check-in accepts only a
//! signed QR token and trusts nothing in it before the signature verifies.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::auth::Principal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{require_organizer, require_student},
    models::notification::kinds,
    qr::QrError,
    repositories::registration::{CancelOutcome, CheckInOutcome, RegisterOutcome},
    routes::events::owned_event,
    state::AppState,
};

/// Check-in request carrying the scanned token
#[derive(Deserialize)]
pub struct CheckInRequest {
    pub qr_token: String,
}

/// Register the authenticated student for an event
pub async fn register(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;

    let registration = match state
        .registration_repository
        .register(event_id, principal.user_id)
        .await?
    {
        RegisterOutcome::Created(registration) => registration,
        RegisterOutcome::EventNotFound => {
            return Err(ApiError::NotFound("Event not found".to_string()));
        }
        RegisterOutcome::EventNotOpen => {
            return Err(ApiError::Conflict(
                "Event is not open for registration".to_string(),
            ));
        }
        RegisterOutcome::CapacityFull => {
            return Err(ApiError::Conflict("Event is at capacity".to_string()));
        }
        RegisterOutcome::AlreadyRegistered => {
            return Err(ApiError::Conflict(
                "Already registered for this event".to_string(),
            ));
        }
    };

    let title = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .map(|event| event.title)
        .unwrap_or_else(|| "the event".to_string());

    state
        .notification_repository
        .notify(
            principal.user_id,
            kinds::REGISTRATION_CONFIRMED,
            &format!("Your registration for '{}' is confirmed", title),
            Some(event_id),
            Some(registration.id),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "registration": registration,
        })),
    ))
}

/// Cancel the authenticated student's registration
pub async fn cancel(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;

    match state
        .registration_repository
        .cancel(event_id, principal.user_id, Utc::now())
        .await?
    {
        CancelOutcome::Cancelled => Ok(Json(json!({
            "success": true,
            "message": "Registration cancelled",
        }))),
        CancelOutcome::NotFound => {
            Err(ApiError::NotFound("Registration not found".to_string()))
        }
        CancelOutcome::EventStarted => Err(ApiError::Conflict(
            "Event has already started".to_string(),
        )),
        CancelOutcome::NotCancellable(status) => Err(ApiError::Conflict(format!(
            "Registration is already {}",
            status.as_str()
        ))),
    }
}

/// List live registrations for an owned event, with student details
pub async fn list_event_registrations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;
    owned_event(&state, &principal, event_id).await?;

    let registrations = state
        .registration_repository
        .list_for_event_with_students(event_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "total": registrations.len(),
        "registrations": registrations,
    })))
}

/// List the authenticated student's registrations
pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;

    let registrations = state
        .registration_repository
        .list_for_user(principal.user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "registrations": registrations,
    })))
}

/// Check a student in from a scanned QR token
///
/// Idempotent: re-scanning an attended registration responds with
/// `already_checked_in: true` instead of an error. A token signed for a
/// different event or registration is rejected even though its signature
/// is valid.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, registration_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CheckInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;
    owned_event(&state, &principal, event_id).await?;

    let qr = state
        .qr_signer
        .decode(&payload.qr_token)
        .map_err(|e| match e {
            QrError::Malformed => ApiError::Validation("Malformed QR payload".to_string()),
            QrError::SignatureMismatch => {
                ApiError::Forbidden("QR signature is invalid".to_string())
            }
        })?;

    if qr.event_id != event_id {
        return Err(ApiError::NotFound(
            "QR token does not belong to this event".to_string(),
        ));
    }
    if qr.registration_id != registration_id {
        return Err(ApiError::NotFound(
            "QR token does not belong to this registration".to_string(),
        ));
    }

    match state
        .registration_repository
        .check_in(registration_id)
        .await?
    {
        CheckInOutcome::CheckedIn(registration) => {
            state
                .notification_repository
                .notify(
                    registration.user_id,
                    kinds::CHECKED_IN,
                    "Your attendance has been confirmed",
                    Some(event_id),
                    Some(registration.id),
                )
                .await;

            Ok(Json(json!({
                "success": true,
                "already_checked_in": false,
                "registration": registration,
            })))
        }
        CheckInOutcome::AlreadyCheckedIn(registration) => Ok(Json(json!({
            "success": true,
            "already_checked_in": true,
            "registration": registration,
        }))),
        CheckInOutcome::NotFound => {
            Err(ApiError::NotFound("Registration not found".to_string()))
        }
        CheckInOutcome::Cancelled => Err(ApiError::Conflict(
            "Registration was cancelled".to_string(),
        )),
    }
}
