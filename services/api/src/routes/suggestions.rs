//! Event suggestion endpoint

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use common::auth::Principal;
use serde::Deserialize;
use serde_json::json;

use crate::{error::ApiError, middleware::require_student, state::AppState};

/// Query parameters for suggestions
#[derive(Debug, Deserialize, Default)]
pub struct SuggestionQuery {
    /// Comma-separated interest tags
    pub interests: Option<String>,
}

/// Suggest upcoming events for the authenticated student
pub async fn suggest(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<SuggestionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_student(&principal)?;

    let interests: Vec<String> = query
        .interests
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let candidates = state.event_repository.list_upcoming(25).await?;
    let (suggestions, source) = state
        .suggestion_client
        .suggest(&interests, &candidates)
        .await;

    Ok(Json(json!({
        "success": true,
        "source": source,
        "suggestions": suggestions,
    })))
}
