//! Certificate endpoints: issuance, status, download, public verification

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
    middleware::require_organizer,
    models::{Registration, notification::kinds},
    repositories::certificate::IssueOutcome,
    state::AppState,
};

/// Fetch a registration and require read access to its certificate
///
/// The student who owns the registration and the organizer of its event
/// may read; anyone else is rejected before existence is revealed.
async fn accessible_registration(
    state: &AppState,
    principal: &Principal,
    event_id: Uuid,
    registration_id: Uuid,
) -> Result<Registration, ApiError> {
    let registration = state
        .registration_repository
        .find_by_id(registration_id)
        .await?
        .filter(|registration| registration.event_id == event_id)
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    if registration.user_id == principal.user_id {
        return Ok(registration);
    }

    let event = state
        .event_repository
        .find_by_id(registration.event_id)
        .await?;
    if event.is_some_and(|event| event.organizer_id == principal.user_id) {
        return Ok(registration);
    }

    Err(ApiError::Forbidden(
        "You do not have access to this registration".to_string(),
    ))
}

/// Issue a certificate for a registration
pub async fn issue(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, registration_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;

    let registration = state
        .registration_repository
        .find_by_id(registration_id)
        .await?
        .filter(|registration| registration.event_id == event_id)
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

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

    match state
        .certificate_repository
        .issue(registration_id, None)
        .await?
    {
        IssueOutcome::Issued(certificate) => {
            state
                .notification_repository
                .notify(
                    registration.user_id,
                    kinds::CERTIFICATE_ISSUED,
                    &format!("Your certificate for '{}' is ready", event.title),
                    Some(event.id),
                    Some(registration_id),
                )
                .await;

            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "certificate": certificate,
                })),
            ))
        }
        IssueOutcome::AlreadyIssued => Err(ApiError::Conflict(
            "Certificate already issued for this registration".to_string(),
        )),
        IssueOutcome::NotCheckedIn => Err(ApiError::Forbidden(
            "Registration was never checked in".to_string(),
        )),
        IssueOutcome::CertificatesDisabled => Err(ApiError::Forbidden(
            "Certificates are not enabled for this event".to_string(),
        )),
        IssueOutcome::RegistrationNotFound => {
            Err(ApiError::NotFound("Registration not found".to_string()))
        }
    }
}

/// Certificate status for a registration
pub async fn status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, registration_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    accessible_registration(&state, &principal, event_id, registration_id).await?;

    let certificate = state
        .certificate_repository
        .find_by_registration(registration_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "issued": certificate.is_some(),
        "certificate": certificate,
    })))
}

/// Download a certificate, stamping the first download time
pub async fn download(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((event_id, registration_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    accessible_registration(&state, &principal, event_id, registration_id).await?;

    let certificate = state
        .certificate_repository
        .record_download(registration_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Certificate not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "certificate": certificate,
    })))
}

/// Public verification by code; exposes no student identity
pub async fn verify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let certificate = state
        .certificate_repository
        .find_by_verification_code(&code)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No certificate matches this verification code".to_string())
        })?;

    Ok(Json(json!({
        "success": true,
        "valid": true,
        "certificate": {
            "certificate_id": certificate.certificate_id,
            "event_id": certificate.event_id,
            "issued_at": certificate.issued_at,
        },
    })))
}
