//! Certificate repository: issuance and verification
//!
//! Issuance is shared between the direct organizer action and completion of
//! a certificate-type document request; both paths run
//! [`CertificateRepository::issue_in_tx`] so the eligibility rules and the
//! registration update cannot diverge. The unique constraint on
//! `registration_id` makes issuance at-most-once per registration even
//! under concurrent calls.

use anyhow::Result;
use chrono::Utc;
use common::database::is_unique_violation;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::certificate::{
    Certificate, generate_certificate_id, generate_verification_code,
};
use crate::models::registration::RegistrationStatus;

const CERTIFICATE_COLUMNS: &str = "certificate_id, registration_id, event_id, user_id, \
     verification_code, certificate_url, issued_at, downloaded_at";

fn row_to_certificate(row: &PgRow) -> Certificate {
    Certificate {
        certificate_id: row.get("certificate_id"),
        registration_id: row.get("registration_id"),
        event_id: row.get("event_id"),
        user_id: row.get("user_id"),
        verification_code: row.get("verification_code"),
        certificate_url: row.get("certificate_url"),
        issued_at: row.get("issued_at"),
        downloaded_at: row.get("downloaded_at"),
    }
}

/// Outcome of a certificate issuance attempt
#[derive(Debug)]
pub enum IssueOutcome {
    Issued(Certificate),
    AlreadyIssued,
    NotCheckedIn,
    CertificatesDisabled,
    RegistrationNotFound,
}

/// Certificate repository
#[derive(Clone)]
pub struct CertificateRepository {
    pool: PgPool,
}

impl CertificateRepository {
    /// Create a new certificate repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a certificate for a registration, inside the caller's transaction
    ///
    /// Eligibility: the registration is attended and its event has
    /// certificates enabled. A `verification_code` is generated here when
    /// the caller supplies none.
    pub async fn issue_in_tx(
        conn: &mut PgConnection,
        registration_id: Uuid,
        certificate_url: Option<&str>,
    ) -> Result<IssueOutcome> {
        let row = sqlx::query(
            r#"
            SELECT r.status, r.user_id, r.event_id, e.certificate_enabled
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            WHERE r.id = $1
            FOR UPDATE OF r
            "#,
        )
        .bind(registration_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(IssueOutcome::RegistrationNotFound);
        };

        let status: String = row.get("status");
        if RegistrationStatus::parse(&status) != Some(RegistrationStatus::Attended) {
            return Ok(IssueOutcome::NotCheckedIn);
        }

        let certificate_enabled: bool = row.get("certificate_enabled");
        if !certificate_enabled {
            return Ok(IssueOutcome::CertificatesDisabled);
        }

        let user_id: Uuid = row.get("user_id");
        let event_id: Uuid = row.get("event_id");

        let now = Utc::now();
        let certificate_id = generate_certificate_id(now);
        let verification_code = generate_verification_code(now);
        let url = match certificate_url {
            Some(url) => url.to_string(),
            None => format!("/certificates/{}.pdf", certificate_id),
        };

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO certificates
                (certificate_id, registration_id, event_id, user_id, verification_code,
                 certificate_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CERTIFICATE_COLUMNS}
            "#,
        ))
        .bind(&certificate_id)
        .bind(registration_id)
        .bind(event_id)
        .bind(user_id)
        .bind(&verification_code)
        .bind(&url)
        .fetch_one(&mut *conn)
        .await;

        let certificate = match inserted {
            Ok(row) => row_to_certificate(&row),
            Err(e) if is_unique_violation(&e) => return Ok(IssueOutcome::AlreadyIssued),
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            r#"
            UPDATE registrations
            SET certificate_issued = TRUE, certificate_id = $2
            WHERE id = $1
            "#,
        )
        .bind(registration_id)
        .bind(&certificate.certificate_id)
        .execute(&mut *conn)
        .await?;

        info!(
            "Issued certificate {} for registration {}",
            certificate.certificate_id, registration_id
        );
        Ok(IssueOutcome::Issued(certificate))
    }

    /// Issue a certificate for a registration in its own transaction
    pub async fn issue(
        &self,
        registration_id: Uuid,
        certificate_url: Option<&str>,
    ) -> Result<IssueOutcome> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::issue_in_tx(&mut tx, registration_id, certificate_url).await?;

        match &outcome {
            IssueOutcome::Issued(_) => tx.commit().await?,
            _ => tx.rollback().await?,
        }

        Ok(outcome)
    }

    /// Find a certificate by its registration
    pub async fn find_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Certificate>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM certificates
            WHERE registration_id = $1
            "#,
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_certificate(&row)))
    }

    /// Find a certificate by verification code (public verification)
    pub async fn find_by_verification_code(&self, code: &str) -> Result<Option<Certificate>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM certificates
            WHERE verification_code = $1
            "#,
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_certificate(&row)))
    }

    /// Record a download, stamping `downloaded_at` on first download
    pub async fn record_download(&self, registration_id: Uuid) -> Result<Option<Certificate>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE certificates
            SET downloaded_at = COALESCE(downloaded_at, now())
            WHERE registration_id = $1
            RETURNING {CERTIFICATE_COLUMNS}
            "#,
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_certificate(&row)))
    }
}
