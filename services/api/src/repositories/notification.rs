//! Notification repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::error;
use uuid::Uuid;

use crate::models::notification::Notification;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, message, read, read_at, event_id, registration_id, metadata, created_at";

fn row_to_notification(row: &PgRow) -> Notification {
    Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: row.get("kind"),
        message: row.get("message"),
        read: row.get("read"),
        read_at: row.get("read_at"),
        event_id: row.get("event_id"),
        registration_id: row.get("registration_id"),
        metadata: row.get("metadata"),
        created_at: row.get("created_at"),
    }
}

/// Notification repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a notification into a user's inbox
    pub async fn create(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        event_id: Option<Uuid>,
        registration_id: Option<Uuid>,
    ) -> Result<Notification> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notifications (user_id, kind, message, event_id, registration_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .bind(event_id)
        .bind(registration_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_notification(&row))
    }

    /// Best-effort insert from a domain trigger; failures are logged only
    ///
    /// A lost notification must never fail the request that produced it.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        event_id: Option<Uuid>,
        registration_id: Option<Uuid>,
    ) {
        if let Err(e) = self
            .create(user_id, kind, message, event_id, registration_id)
            .await
        {
            error!("Failed to write notification for {}: {}", user_id, e);
        }
    }

    /// List a user's notifications, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<(Vec<Notification>, i64)> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let unread: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.iter().map(row_to_notification).collect(), unread))
    }

    /// Mark one notification read; scoped to its owner
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE notifications
            SET read = TRUE, read_at = COALESCE(read_at, now())
            WHERE id = $1 AND user_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_notification(&row)))
    }

    /// Mark all of a user's notifications read
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE, read_at = COALESCE(read_at, now())
            WHERE user_id = $1 AND read = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a notification; scoped to its owner
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
