//! Authentication middleware for the event API service
//!
//! Token validation is delegated to the shared `common::auth::TokenVerifier`
//! injected through the application state; this file only adapts it to
//! axum's middleware shape and provides role guards for handlers.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common::auth::{Principal, Role, bearer_token};

use crate::{error::ApiError, state::AppState};

/// Require a valid access token; inserts the `Principal` into extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = bearer_token(auth_header).ok_or(ApiError::Unauthorized)?;

    let principal = state
        .verifier
        .authenticate(token)
        .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Guard a handler to organizer principals
pub fn require_organizer(principal: &Principal) -> Result<(), ApiError> {
    if principal.has_any_role(&[Role::Organizer]) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Organizer role required".to_string(),
        ))
    }
}

/// Guard a handler to student principals
pub fn require_student(principal: &Principal) -> Result<(), ApiError> {
    if principal.has_any_role(&[Role::Student]) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Student role required".to_string()))
    }
}
