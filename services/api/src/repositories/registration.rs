//! Registration repository: the registration / check-in lifecycle
//!
//! Capacity is enforced with a conditional compare-and-increment on the
//! event row, and pair uniqueness with a partial unique index, both inside
//! the same transaction as the registration insert. There is no
//! read-then-write window for concurrent registrations to slip through.

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::database::is_unique_violation;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::registration::{Registration, RegistrationStatus};

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, registered_at, check_in_at, \
     certificate_issued, certificate_id";

pub(crate) fn row_to_registration(row: &PgRow) -> Registration {
    let status: String = row.get("status");
    Registration {
        id: row.get("id"),
        event_id: row.get("event_id"),
        user_id: row.get("user_id"),
        status: RegistrationStatus::parse(&status).unwrap_or(RegistrationStatus::Registered),
        registered_at: row.get("registered_at"),
        check_in_at: row.get("check_in_at"),
        certificate_issued: row.get("certificate_issued"),
        certificate_id: row.get("certificate_id"),
    }
}

/// Registration joined with the student's directory fields
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegistrationWithStudent {
    #[serde(flatten)]
    pub registration: Registration,
    pub student_name: String,
    pub student_email: String,
}

/// Outcome of a registration attempt
#[derive(Debug)]
pub enum RegisterOutcome {
    Created(Registration),
    EventNotFound,
    EventNotOpen,
    CapacityFull,
    AlreadyRegistered,
}

/// Outcome of a check-in attempt
#[derive(Debug)]
pub enum CheckInOutcome {
    CheckedIn(Registration),
    /// Re-scan of an attended registration; a no-op by contract
    AlreadyCheckedIn(Registration),
    NotFound,
    Cancelled,
}

/// Outcome of a cancellation attempt
#[derive(Debug)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
    EventStarted,
    /// Registration is attended or already cancelled
    NotCancellable(RegistrationStatus),
}

/// Registration repository
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Create a new registration repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a user for an event
    ///
    /// The capacity check and the insert commit or roll back together, so
    /// two concurrent calls near capacity can never both succeed past it,
    /// and a duplicate insert rolls the increment back.
    pub async fn register(&self, event_id: Uuid, user_id: Uuid) -> Result<RegisterOutcome> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE events
            SET registered_count = registered_count + 1, updated_at = now()
            WHERE id = $1 AND status = 'published' AND registered_count < capacity
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let row = sqlx::query("SELECT status FROM events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;

            return Ok(match row {
                None => RegisterOutcome::EventNotFound,
                Some(row) => {
                    let status: String = row.get("status");
                    if status == "published" {
                        RegisterOutcome::CapacityFull
                    } else {
                        RegisterOutcome::EventNotOpen
                    }
                }
            });
        }

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO registrations (event_id, user_id)
            VALUES ($1, $2)
            RETURNING {REGISTRATION_COLUMNS}
            "#,
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(row) => {
                tx.commit().await?;
                let registration = row_to_registration(&row);
                info!(
                    "User {} registered for event {} ({})",
                    user_id, event_id, registration.id
                );
                Ok(RegisterOutcome::Created(registration))
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                Ok(RegisterOutcome::AlreadyRegistered)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a registration by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_registration(&row)))
    }

    /// Find the live (non-cancelled) registration for a (event, user) pair
    pub async fn find_live(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE event_id = $1 AND user_id = $2 AND status <> 'cancelled'
            "#,
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_registration(&row)))
    }

    /// List live registrations for an event
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE event_id = $1 AND status <> 'cancelled'
            ORDER BY registered_at ASC
            "#,
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_registration).collect())
    }

    /// List live registrations for an event with the student's name and email
    pub async fn list_for_event_with_students(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationWithStudent>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.event_id, r.user_id, r.status, r.registered_at, r.check_in_at,
                   r.certificate_issued, r.certificate_id,
                   u.full_name AS student_name, u.email AS student_email
            FROM registrations r
            JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1 AND r.status <> 'cancelled'
            ORDER BY r.registered_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| RegistrationWithStudent {
                registration: row_to_registration(row),
                student_name: row.get("student_name"),
                student_email: row.get("student_email"),
            })
            .collect())
    }

    /// List a user's registrations across events
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE user_id = $1 AND status <> 'cancelled'
            ORDER BY registered_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_registration).collect())
    }

    /// Confirm attendance for a registration
    ///
    /// Idempotent: a second check-in returns the existing state instead of
    /// an error. The conditional update is the transition guard; a
    /// concurrent double-scan resolves to one `CheckedIn` and one
    /// `AlreadyCheckedIn`.
    pub async fn check_in(&self, registration_id: Uuid) -> Result<CheckInOutcome> {
        let updated = sqlx::query(&format!(
            r#"
            UPDATE registrations
            SET status = 'attended', check_in_at = now()
            WHERE id = $1 AND status = 'registered'
            RETURNING {REGISTRATION_COLUMNS}
            "#,
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            let registration = row_to_registration(&row);
            info!("Checked in registration {}", registration_id);
            return Ok(CheckInOutcome::CheckedIn(registration));
        }

        match self.find_by_id(registration_id).await? {
            None => Ok(CheckInOutcome::NotFound),
            Some(registration) => match registration.status {
                RegistrationStatus::Attended => Ok(CheckInOutcome::AlreadyCheckedIn(registration)),
                RegistrationStatus::Cancelled => Ok(CheckInOutcome::Cancelled),
                // Unreachable unless the conditional update raced a cancel.
                RegistrationStatus::Registered => Ok(CheckInOutcome::NotFound),
            },
        }
    }

    /// Cancel a user's registration for an event
    ///
    /// Permitted only while the registration is in `registered` state and
    /// the event has not started. The cancelled mark and the counter
    /// decrement share one transaction.
    pub async fn cancel(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let cancelled = sqlx::query(
            r#"
            UPDATE registrations r
            SET status = 'cancelled'
            FROM events e
            WHERE r.event_id = e.id
              AND r.event_id = $1 AND r.user_id = $2
              AND r.status = 'registered'
              AND e.starts_at > $3
            RETURNING r.id
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        if cancelled.is_none() {
            let row = sqlx::query(
                r#"
                SELECT r.status, e.starts_at
                FROM registrations r
                JOIN events e ON e.id = r.event_id
                WHERE r.event_id = $1 AND r.user_id = $2 AND r.status <> 'cancelled'
                "#,
            )
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

            return Ok(match row {
                None => CancelOutcome::NotFound,
                Some(row) => {
                    let status: String = row.get("status");
                    let starts_at: DateTime<Utc> = row.get("starts_at");
                    match RegistrationStatus::parse(&status) {
                        Some(RegistrationStatus::Registered) if starts_at <= now => {
                            CancelOutcome::EventStarted
                        }
                        Some(status) => CancelOutcome::NotCancellable(status),
                        None => CancelOutcome::NotFound,
                    }
                }
            });
        }

        sqlx::query(
            r#"
            UPDATE events
            SET registered_count = registered_count - 1, updated_at = now()
            WHERE id = $1 AND registered_count > 0
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Cancelled registration for user {} on event {}", user_id, event_id);
        Ok(CancelOutcome::Cancelled)
    }
}
