//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use common::auth::{Principal, Role, TokenType};
use common::database::is_unique_violation;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    AppState,
    error::ApiError,
    middleware::auth_middleware,
    models::{ChangePassword, LoginCredentials, NewUser, UpdateProfile, UserResponse},
    validation::{validate_email, validate_full_name, validate_password},
};

/// Response for token issuance
#[derive(Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Request for token refresh and logout
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", patch(update_profile))
        .route("/auth/password", patch(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", get(logout))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User signup endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    validate_full_name(&payload.full_name).map_err(ApiError::Validation)?;
    validate_email(&payload.email).map_err(ApiError::Validation)?;
    validate_password(&payload.password).map_err(ApiError::Validation)?;

    // Role defaults to student; the claim comparison is case-insensitive.
    let role = match &payload.role {
        Some(value) => Role::parse(value)
            .ok_or_else(|| ApiError::Validation(format!("Unknown role: {}", value)))?,
        None => Role::Student,
    };

    let password_hash =
        crate::repositories::UserRepository::hash_password(&payload.password).map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::Internal
        })?;

    let user = state
        .user_repository
        .create(&payload, role.as_str(), &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("An account with this email already exists".to_string())
            } else {
                error!("Failed to create user: {}", e);
                ApiError::Internal
            }
        })?;

    info!("Registered user {} as {}", user.email, user.role);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": UserResponse::from(user),
        })),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> Result<impl IntoResponse, ApiError> {
    let key = payload.email.to_lowercase();

    let allowed = state.rate_limiter.is_allowed(&key).await.map_err(|e| {
        error!("Rate limiter failure: {}", e);
        ApiError::Internal
    })?;
    if !allowed {
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::Internal
        })?
        .ok_or(ApiError::Unauthorized)?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::Internal
        })?;
    if !valid {
        return Err(ApiError::Unauthorized);
    }

    state.rate_limiter.reset(&key).await;

    let access_token = state.jwt_service.generate_access_token(&user).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        ApiError::Internal
    })?;

    let refresh_token = state
        .jwt_service
        .generate_refresh_token(&user)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ApiError::Internal
        })?;

    state
        .session_manager
        .create_session(user.id, &refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to store session: {}", e);
            ApiError::Internal
        })?;

    info!("Login succeeded for user {}", user.id);

    let response = TokenResponse {
        success: true,
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
        user: UserResponse::from(user),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized)?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized);
    }

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to check token blacklist: {}", e);
            ApiError::Internal
        })?;
    if is_blacklisted {
        return Err(ApiError::Unauthorized);
    }

    let session_valid = state
        .session_manager
        .is_session_valid(claims.sub, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to check session: {}", e);
            ApiError::Internal
        })?;
    if !session_valid {
        return Err(ApiError::Unauthorized);
    }

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::Internal
        })?
        .ok_or(ApiError::Unauthorized)?;

    let access_token = state.jwt_service.generate_access_token(&user).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        ApiError::Internal
    })?;

    let new_refresh_token = state
        .jwt_service
        .rotate_refresh_token(&state.redis_pool, &user, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to rotate refresh token: {}", e);
            ApiError::Internal
        })?;

    state
        .session_manager
        .create_session(user.id, &new_refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to update session: {}", e);
            ApiError::Internal
        })?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "access_token": access_token,
            "refresh_token": new_refresh_token,
            "token_type": "Bearer",
            "expires_in": state.jwt_service.access_token_expiry(),
        })),
    ))
}

/// Logout endpoint: blacklists the refresh token and drops the session
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized)?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized);
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| {
            error!("Failed to get current time: {}", e);
            ApiError::Internal
        })?
        .as_secs();

    let expiry = claims.exp.saturating_sub(now);
    state
        .jwt_service
        .blacklist_token(&state.redis_pool, &payload.refresh_token, expiry)
        .await
        .map_err(|e| {
            error!("Failed to blacklist token: {}", e);
            ApiError::Internal
        })?;

    state
        .session_manager
        .delete_session(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to remove session: {}", e);
            ApiError::Internal
        })?;

    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "message": "Logged out successfully"})),
    ))
}

/// Authenticated profile read
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(principal.user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(user),
    })))
}

/// Update the authenticated user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<UpdateProfile>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(name) = &payload.full_name {
        validate_full_name(name).map_err(ApiError::Validation)?;
    }

    let user = state
        .user_repository
        .update_profile(principal.user_id, &payload)
        .await
        .map_err(|e| {
            error!("Failed to update profile: {}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(user),
    })))
}

/// Change the authenticated user's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePassword>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&payload.new_password).map_err(ApiError::Validation)?;

    let user = state
        .user_repository
        .find_by_id(principal.user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.current_password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::Internal
        })?;
    if !valid {
        return Err(ApiError::Forbidden(
            "Current password is incorrect".to_string(),
        ));
    }

    state
        .user_repository
        .update_password(user.id, &payload.new_password)
        .await
        .map_err(|e| {
            error!("Failed to update password: {}", e);
            ApiError::Internal
        })?;

    info!("Password changed for user {}", user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Password updated",
    })))
}
