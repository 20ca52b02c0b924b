//! Event suggestion client with a deterministic local fallback
//!
//! Suggestions come from an external service reached over HTTP with a
//! bounded timeout. Any failure — unreachable host, non-2xx status, bad
//! body, timeout — degrades to a locally ranked list and the response
//! still reports `success: true`. The caller can tell the two apart only
//! through the `source` field.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::models::Event;

/// Source of a suggestion list
pub const SOURCE_REMOTE: &str = "ai";
pub const SOURCE_FALLBACK: &str = "fallback";

/// One suggested event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub event_id: Uuid,
    pub title: String,
    pub reason: String,
}

#[derive(Serialize)]
struct SuggestionRequest<'a> {
    interests: &'a [String],
    events: Vec<EventContext>,
}

#[derive(Serialize)]
struct EventContext {
    event_id: Uuid,
    title: String,
    category: String,
    seats_remaining: i32,
}

#[derive(Deserialize)]
struct SuggestionResponse {
    suggestions: Vec<Suggestion>,
}

/// Suggestion service configuration
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Remote service endpoint; the fallback is used when unset
    pub url: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl SuggestionConfig {
    /// Create a new SuggestionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SUGGESTION_SERVICE_URL`: endpoint of the suggestion service (optional)
    /// - `SUGGESTION_TIMEOUT_SECONDS`: request timeout (default: 15)
    pub fn from_env() -> Self {
        let url = std::env::var("SUGGESTION_SERVICE_URL").ok();
        let timeout_seconds = std::env::var("SUGGESTION_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);

        SuggestionConfig {
            url,
            timeout_seconds,
        }
    }
}

/// Suggestion client
#[derive(Clone)]
pub struct SuggestionClient {
    http: reqwest::Client,
    config: SuggestionConfig,
}

impl SuggestionClient {
    /// Create a new suggestion client
    pub fn new(config: SuggestionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(SuggestionClient { http, config })
    }

    /// Suggest events for a student, falling back locally on any failure
    pub async fn suggest(
        &self,
        interests: &[String],
        candidates: &[Event],
    ) -> (Vec<Suggestion>, &'static str) {
        if let Some(url) = &self.config.url {
            match self.suggest_remote(url, interests, candidates).await {
                Ok(suggestions) => return (suggestions, SOURCE_REMOTE),
                Err(e) => {
                    warn!("Suggestion service unavailable, using fallback: {}", e);
                }
            }
        }

        (fallback_suggestions(candidates), SOURCE_FALLBACK)
    }

    async fn suggest_remote(
        &self,
        url: &str,
        interests: &[String],
        candidates: &[Event],
    ) -> Result<Vec<Suggestion>> {
        let request = SuggestionRequest {
            interests,
            events: candidates
                .iter()
                .map(|e| EventContext {
                    event_id: e.id,
                    title: e.title.clone(),
                    category: e.category.clone(),
                    seats_remaining: e.seats_remaining(),
                })
                .collect(),
        };

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<SuggestionResponse>()
            .await?;

        Ok(response.suggestions)
    }
}

/// Deterministic local ranking: most seats remaining first, then soonest
///
/// The same candidate list always yields the same suggestions.
pub fn fallback_suggestions(candidates: &[Event]) -> Vec<Suggestion> {
    let mut ranked: Vec<&Event> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.seats_remaining()
            .cmp(&a.seats_remaining())
            .then(a.starts_at.cmp(&b.starts_at))
            .then(a.id.cmp(&b.id))
    });

    ranked
        .into_iter()
        .take(5)
        .map(|event| Suggestion {
            event_id: event.id,
            title: event.title.clone(),
            reason: format!("{} seats still available", event.seats_remaining()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventStatus;
    use chrono::{Duration as ChronoDuration, Utc};

    fn event(title: &str, capacity: i32, registered: i32, days_out: i64) -> Event {
        Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            category: "general".to_string(),
            venue: "Hall A".to_string(),
            starts_at: Utc::now() + ChronoDuration::days(days_out),
            ends_at: None,
            capacity,
            registered_count: registered,
            status: EventStatus::Published,
            certificate_enabled: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_fallback_ranks_by_open_seats_then_start() {
        let candidates = vec![
            event("nearly full", 100, 99, 1),
            event("wide open", 100, 10, 5),
            event("half full", 100, 50, 2),
        ];

        let suggestions = fallback_suggestions(&candidates);
        let titles: Vec<&str> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["wide open", "half full", "nearly full"]);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let candidates: Vec<Event> = (0..10)
            .map(|i| event(&format!("event {}", i), 100, i * 7 % 50, i as i64))
            .collect();

        let first = fallback_suggestions(&candidates);
        let second = fallback_suggestions(&candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fallback_caps_at_five() {
        let candidates: Vec<Event> =
            (0..12).map(|i| event(&format!("e{}", i), 50, 0, i)).collect();
        assert_eq!(fallback_suggestions(&candidates).len(), 5);
    }

    #[test]
    fn test_fallback_empty_candidates() {
        assert!(fallback_suggestions(&[]).is_empty());
    }
}
