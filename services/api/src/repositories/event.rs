//! Event repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::event::{Event, EventQuery, EventStatus, NewEvent, UpdateEvent};

const EVENT_COLUMNS: &str = "id, organizer_id, title, description, category, venue, starts_at, \
     ends_at, capacity, registered_count, status, certificate_enabled, created_at, updated_at";

pub(crate) fn row_to_event(row: &PgRow) -> Event {
    let status: String = row.get("status");
    Event {
        id: row.get("id"),
        organizer_id: row.get("organizer_id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        venue: row.get("venue"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        capacity: row.get("capacity"),
        registered_count: row.get("registered_count"),
        status: EventStatus::parse(&status).unwrap_or(EventStatus::Draft),
        certificate_enabled: row.get("certificate_enabled"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Event repository
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event owned by the given organizer
    pub async fn create(&self, organizer_id: Uuid, new_event: &NewEvent) -> Result<Event> {
        info!("Creating event '{}' for {}", new_event.title, organizer_id);

        let status = new_event.status.unwrap_or(EventStatus::Draft);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO events
                (organizer_id, title, description, category, venue, starts_at, ends_at,
                 capacity, status, certificate_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {EVENT_COLUMNS}
            "#,
        ))
        .bind(organizer_id)
        .bind(&new_event.title)
        .bind(new_event.description.as_deref().unwrap_or(""))
        .bind(new_event.category.as_deref().unwrap_or("general"))
        .bind(&new_event.venue)
        .bind(new_event.starts_at)
        .bind(new_event.ends_at)
        .bind(new_event.capacity)
        .bind(status.as_str())
        .bind(new_event.certificate_enabled.unwrap_or(false))
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_event(&row))
    }

    /// Find an event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_event(&row)))
    }

    /// List published events with pagination and filters
    pub async fn list_published(&self, query: &EventQuery) -> Result<(Vec<Event>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) as i64 * limit as i64;
        let upcoming_only = query.upcoming.unwrap_or(false);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE status = 'published'
              AND ($3::text IS NULL OR category = $3)
              AND (NOT $4 OR starts_at > now())
            ORDER BY starts_at ASC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit as i64)
        .bind(offset)
        .bind(&query.category)
        .bind(upcoming_only)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM events
            WHERE status = 'published'
              AND ($1::text IS NULL OR category = $1)
              AND (NOT $2 OR starts_at > now())
            "#,
        )
        .bind(&query.category)
        .bind(upcoming_only)
        .fetch_one(&self.pool)
        .await?;

        let events = rows.iter().map(row_to_event).collect();
        Ok((events, total))
    }

    /// List every event owned by an organizer, drafts included
    pub async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE organizer_id = $1
            ORDER BY starts_at ASC
            "#,
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_event).collect())
    }

    /// Update an event's fields; absent fields are left unchanged
    pub async fn update(&self, id: Uuid, update: &UpdateEvent) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                venue = COALESCE($5, venue),
                starts_at = COALESCE($6, starts_at),
                ends_at = COALESCE($7, ends_at),
                capacity = COALESCE($8, capacity),
                status = COALESCE($9, status),
                certificate_enabled = COALESCE($10, certificate_enabled),
                updated_at = now()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.category)
        .bind(&update.venue)
        .bind(update.starts_at)
        .bind(update.ends_at)
        .bind(update.capacity)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.certificate_enabled)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_event(&row)))
    }

    /// Delete an event; registrations cascade at the storage layer
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Upcoming published events, used by the suggestion fallback
    pub async fn list_upcoming(&self, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE status = 'published' AND starts_at > now()
            ORDER BY starts_at ASC
            LIMIT $1
            "#,
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_event).collect())
    }
}
