//! QR code token endpoints
//!
//! Tokens are signed server-side; the frontend renders them into images.
//! Organizers pull tokens in bulk for a check-in desk, students fetch
//! the token for their own registration.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use common::auth::Principal;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{require_organizer, require_student},
    qr::{QrPayload, check_in_code},
    routes::events::owned_event,
    state::AppState,
};

/// Signed tokens for every live registration of an owned event
pub async fn event_qr_codes(
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

    let issued_at = Utc::now().timestamp();
    let mut qr_codes = Vec::with_capacity(registrations.len());
    for entry in &registrations {
        let payload = QrPayload {
            registration_id: entry.registration.id,
            event_id,
            student_id: entry.registration.user_id,
            student_name: entry.student_name.clone(),
            check_in_code: check_in_code(entry.registration.id),
            issued_at,
        };
        let token = state.qr_signer.encode(&payload).map_err(|e| {
            error!("Failed to sign QR token: {}", e);
            ApiError::Internal
        })?;

        qr_codes.push(json!({
            "registration_id": entry.registration.id,
            "student_name": entry.student_name,
            "check_in_code": payload.check_in_code,
            "qr_token": token,
        }));
    }

    Ok(Json(json!({
        "success": true,
        "event_id": event_id,
        "total": qr_codes.len(),
        "qr_codes": qr_codes,
    })))
}

/// Signed token for the authenticated student's own registration
pub async fn my_qr_code(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;

    let registration = state
        .registration_repository
        .find_live(event_id, principal.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No registration found for this event".to_string())
        })?;

    let payload = QrPayload {
        registration_id: registration.id,
        event_id,
        student_id: principal.user_id,
        student_name: principal.name.clone(),
        check_in_code: check_in_code(registration.id),
        issued_at: Utc::now().timestamp(),
    };
    let token = state.qr_signer.encode(&payload).map_err(|e| {
        error!("Failed to sign QR token: {}", e);
        ApiError::Internal
    })?;

    Ok(Json(json!({
        "success": true,
        "registration": registration,
        "check_in_code": payload.check_in_code,
        "qr_token": token,
    })))
}
