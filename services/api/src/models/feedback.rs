//! Feedback model and validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on free-text fields
pub const MAX_TEXT_LEN: usize = 2000;

/// Feedback entity
///
/// `student_name` is nulled at write time for anonymous submissions.
/// `user_id` stays in the table for the one-per-student constraint, so
/// anonymous rows must pass through [`Feedback::redact`] before they are
/// serialized anywhere.
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub suggestions: Option<String>,
    pub anonymous: bool,
    pub student_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Feedback {
    /// Strip identifying fields from an anonymous submission
    pub fn redact(mut self) -> Self {
        if self.anonymous {
            self.user_id = None;
            self.student_name = None;
        }
        self
    }
}

/// Feedback submission payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    pub rating: i32,
    pub comment: Option<String>,
    pub suggestions: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

impl NewFeedback {
    /// Validate rating range and text bounds
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be an integer between 1 and 5".to_string());
        }

        for (field, value) in [("comment", &self.comment), ("suggestions", &self.suggestions)] {
            if let Some(text) = value {
                if text.len() > MAX_TEXT_LEN {
                    return Err(format!(
                        "{} must be at most {} characters",
                        field, MAX_TEXT_LEN
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(rating: i32) -> NewFeedback {
        NewFeedback {
            rating,
            comment: None,
            suggestions: None,
            anonymous: false,
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(feedback(1).validate().is_ok());
        assert!(feedback(5).validate().is_ok());
        assert!(feedback(0).validate().is_err());
        assert!(feedback(6).validate().is_err());
        assert!(feedback(-3).validate().is_err());
    }

    #[test]
    fn test_anonymous_feedback_serializes_without_identity() {
        let entry = Feedback {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            rating: 4,
            comment: Some("useful workshop".to_string()),
            suggestions: None,
            anonymous: true,
            student_name: Some("Ada Lovelace".to_string()),
            submitted_at: Utc::now(),
        };

        let redacted = entry.clone().redact();
        assert_eq!(redacted.user_id, None);
        assert_eq!(redacted.student_name, None);

        let value = serde_json::to_value(&redacted).unwrap();
        assert!(value["user_id"].is_null());
        assert!(value["student_name"].is_null());
        assert_eq!(value["rating"], 4);

        let named = Feedback {
            anonymous: false,
            ..entry
        }
        .redact();
        assert!(named.user_id.is_some());
        assert_eq!(named.student_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_text_length_bounds() {
        let mut fb = feedback(4);
        fb.comment = Some("great event".to_string());
        assert!(fb.validate().is_ok());

        fb.comment = Some("x".repeat(MAX_TEXT_LEN + 1));
        assert!(fb.validate().is_err());

        fb.comment = None;
        fb.suggestions = Some("x".repeat(MAX_TEXT_LEN + 1));
        assert!(fb.validate().is_err());
    }
}
