//! Authentication middleware for the auth service
//!
//! Validation goes through the shared `common::auth::TokenVerifier` held in
//! the application state, so there is exactly one claims structure and one
//! key-loading path across the platform.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common::auth::bearer_token;

use crate::{AppState, error::ApiError};

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
