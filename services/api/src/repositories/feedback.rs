//! Feedback repository for database operations

use anyhow::Result;
use common::database::is_unique_violation;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::feedback::{Feedback, NewFeedback};

const FEEDBACK_COLUMNS: &str =
    "id, event_id, user_id, rating, comment, suggestions, anonymous, student_name, submitted_at";

fn row_to_feedback(row: &PgRow) -> Feedback {
    Feedback {
        id: row.get("id"),
        event_id: row.get("event_id"),
        user_id: Some(row.get("user_id")),
        rating: row.get("rating"),
        comment: row.get("comment"),
        suggestions: row.get("suggestions"),
        anonymous: row.get("anonymous"),
        student_name: row.get("student_name"),
        submitted_at: row.get("submitted_at"),
    }
    .redact()
}

/// Outcome of a feedback submission
#[derive(Debug)]
pub enum FeedbackOutcome {
    Created(Feedback),
    NotAttended,
    Duplicate,
}

/// Feedback repository
#[derive(Clone)]
pub struct FeedbackRepository {
    pool: PgPool,
}

impl FeedbackRepository {
    /// Create a new feedback repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submit feedback for an event
    ///
    /// Requires a checked-in registration for the pair; one submission per
    /// (user, event), backed by the unique constraint. Anonymous
    /// submissions store a NULL student name, and every mapped row is
    /// redacted so the submitter's id never serializes either.
    pub async fn submit(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        student_name: &str,
        payload: &NewFeedback,
    ) -> Result<FeedbackOutcome> {
        let attended: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM registrations
            WHERE event_id = $1 AND user_id = $2
              AND (status = 'attended' OR check_in_at IS NOT NULL)
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if attended.is_none() {
            return Ok(FeedbackOutcome::NotAttended);
        }

        let stored_name = if payload.anonymous {
            None
        } else {
            Some(student_name)
        };

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO feedback
                (event_id, user_id, rating, comment, suggestions, anonymous, student_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FEEDBACK_COLUMNS}
            "#,
        ))
        .bind(event_id)
        .bind(user_id)
        .bind(payload.rating)
        .bind(&payload.comment)
        .bind(&payload.suggestions)
        .bind(payload.anonymous)
        .bind(stored_name)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => {
                info!("Feedback recorded for event {} by {}", event_id, user_id);
                Ok(FeedbackOutcome::Created(row_to_feedback(&row)))
            }
            Err(e) if is_unique_violation(&e) => Ok(FeedbackOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    /// List feedback for an event with the average rating
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<(Vec<Feedback>, Option<f64>)> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {FEEDBACK_COLUMNS}
            FROM feedback
            WHERE event_id = $1
            ORDER BY submitted_at DESC
            "#,
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let average: Option<f64> =
            sqlx::query_scalar("SELECT AVG(rating)::float8 FROM feedback WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows.iter().map(row_to_feedback).collect(), average))
    }
}
