//! Document request endpoints
//!
//! Students open requests; organizers move them through the document
//! state machine. Completing a certificate-type request issues the
//! certificate as part of the same transition.

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
    models::{
        DocumentType,
        document::{NewDocumentRequest, ProcessDocumentRequest},
        notification::kinds,
    },
    repositories::document::ProcessOutcome,
    state::AppState,
};

const URGENCY_LEVELS: &[&str] = &["normal", "urgent"];

/// Open a new document request for the authenticated student
pub async fn create_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<NewDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;

    if payload.document_type == DocumentType::Certificate && payload.event_id.is_none() {
        return Err(ApiError::Validation(
            "Certificate requests must reference an event".to_string(),
        ));
    }
    if let Some(urgency) = &payload.urgency {
        if !URGENCY_LEVELS.contains(&urgency.as_str()) {
            return Err(ApiError::Validation(format!(
                "Unknown urgency level: {}",
                urgency
            )));
        }
    }
    if let Some(event_id) = payload.event_id {
        state
            .event_repository
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    }

    let request = state
        .document_repository
        .create(principal.user_id, &principal.email, &payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "request": request,
        })),
    ))
}

/// List the authenticated student's requests
pub async fn my_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;

    let requests = state
        .document_repository
        .list_for_student(principal.user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "requests": requests,
    })))
}

/// List all document requests (organizer queue)
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;

    let requests = state.document_repository.list_all().await?;

    Ok(Json(json!({
        "success": true,
        "total": requests.len(),
        "requests": requests,
    })))
}

/// Apply one state transition to a document request
pub async fn process(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ProcessDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_organizer(&principal)?;

    match state
        .document_repository
        .process(request_id, principal.user_id, &payload)
        .await?
    {
        ProcessOutcome::Processed {
            request,
            issued_certificate_id,
        } => {
            state
                .notification_repository
                .notify(
                    request.student_id,
                    kinds::DOCUMENT_PROCESSED,
                    &format!(
                        "Your {} request is now {}",
                        request.document_type.as_str(),
                        request.status.as_str()
                    ),
                    request.event_id,
                    None,
                )
                .await;

            if issued_certificate_id.is_some() {
                state
                    .notification_repository
                    .notify(
                        request.student_id,
                        kinds::CERTIFICATE_ISSUED,
                        "Your certificate is ready",
                        request.event_id,
                        None,
                    )
                    .await;
            }

            Ok(Json(json!({
                "success": true,
                "request": request,
                "issued_certificate_id": issued_certificate_id,
            })))
        }
        ProcessOutcome::NotFound => {
            Err(ApiError::NotFound("Document request not found".to_string()))
        }
        ProcessOutcome::IllegalTransition { from, to } => Err(ApiError::Conflict(format!(
            "Cannot move a {} request to {}",
            from.as_str(),
            to.as_str()
        ))),
        ProcessOutcome::MissingFileUrl => Err(ApiError::Validation(
            "Completion requires a file URL".to_string(),
        )),
        ProcessOutcome::CertificateIneligible(reason) => {
            Err(ApiError::Conflict(reason.to_string()))
        }
    }
}
