//! Document request repository and processing workflow
//!
//! Status changes are guarded by the `DocumentStatus` transition table and
//! run under a row lock, so a terminal request can never be re-processed.
//! Completing a certificate-type request issues the certificate through the
//! shared issuance routine, in the same transaction as the status change.

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::document::{
    DocumentRequest, DocumentStatus, DocumentType, NewDocumentRequest, ProcessDocumentRequest,
};
use crate::models::registration::RegistrationStatus;
use crate::repositories::certificate::{CertificateRepository, IssueOutcome};

const DOCUMENT_COLUMNS: &str = "id, student_id, student_email, event_id, document_type, urgency, \
     purpose, status, admin_notes, file_url, processed_by, created_at, updated_at";

fn row_to_document(row: &PgRow) -> DocumentRequest {
    let document_type: String = row.get("document_type");
    let status: String = row.get("status");
    DocumentRequest {
        id: row.get("id"),
        student_id: row.get("student_id"),
        student_email: row.get("student_email"),
        event_id: row.get("event_id"),
        document_type: DocumentType::parse(&document_type).unwrap_or(DocumentType::Other),
        urgency: row.get("urgency"),
        purpose: row.get("purpose"),
        status: DocumentStatus::parse(&status).unwrap_or(DocumentStatus::Pending),
        admin_notes: row.get("admin_notes"),
        file_url: row.get("file_url"),
        processed_by: row.get("processed_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Outcome of processing a document request
#[derive(Debug)]
pub enum ProcessOutcome {
    Processed {
        request: DocumentRequest,
        /// Set when completion of a certificate request issued one
        issued_certificate_id: Option<String>,
    },
    NotFound,
    IllegalTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },
    MissingFileUrl,
    /// Certificate-type completion failed its eligibility rules
    CertificateIneligible(&'static str),
}

/// Document request repository
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new document request for a student
    pub async fn create(
        &self,
        student_id: Uuid,
        student_email: &str,
        payload: &NewDocumentRequest,
    ) -> Result<DocumentRequest> {
        let urgency = payload.urgency.as_deref().unwrap_or("normal");

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO document_requests
                (student_id, student_email, event_id, document_type, urgency, purpose)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(student_id)
        .bind(student_email)
        .bind(payload.event_id)
        .bind(payload.document_type.as_str())
        .bind(urgency)
        .bind(&payload.purpose)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Document request created by {} ({})",
            student_id,
            payload.document_type.as_str()
        );
        Ok(row_to_document(&row))
    }

    /// Find a document request by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentRequest>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM document_requests
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_document(&row)))
    }

    /// List a student's own requests
    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<DocumentRequest>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM document_requests
            WHERE student_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_document).collect())
    }

    /// List all requests, newest first (admin view)
    pub async fn list_all(&self) -> Result<Vec<DocumentRequest>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM document_requests
            ORDER BY created_at DESC
            "#,
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_document).collect())
    }

    /// Process a document request: apply one state transition
    ///
    /// Records admin notes and the processing principal on every
    /// transition. Completion requires a file URL; certificate-type
    /// completion additionally issues the certificate against the
    /// student's attended registration for the linked event.
    pub async fn process(
        &self,
        id: Uuid,
        processed_by: Uuid,
        payload: &ProcessDocumentRequest,
    ) -> Result<ProcessOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM document_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(ProcessOutcome::NotFound);
        };
        let request = row_to_document(&row);

        if !request.status.can_transition(payload.status) {
            return Ok(ProcessOutcome::IllegalTransition {
                from: request.status,
                to: payload.status,
            });
        }

        let file_url = payload.file_url.as_deref().or(request.file_url.as_deref());

        let mut issued_certificate_id = None;
        if payload.status == DocumentStatus::Completed {
            let Some(file_url) = file_url.filter(|url| !url.trim().is_empty()) else {
                return Ok(ProcessOutcome::MissingFileUrl);
            };

            if request.document_type == DocumentType::Certificate {
                let Some(event_id) = request.event_id else {
                    return Ok(ProcessOutcome::CertificateIneligible(
                        "Request is not linked to an event",
                    ));
                };

                let registration_id: Option<Uuid> = sqlx::query_scalar(
                    r#"
                    SELECT id
                    FROM registrations
                    WHERE event_id = $1 AND user_id = $2 AND status = $3
                    "#,
                )
                .bind(event_id)
                .bind(request.student_id)
                .bind(RegistrationStatus::Attended.as_str())
                .fetch_optional(&mut *tx)
                .await?;

                let Some(registration_id) = registration_id else {
                    return Ok(ProcessOutcome::CertificateIneligible(
                        "No attended registration for this event",
                    ));
                };

                match CertificateRepository::issue_in_tx(&mut tx, registration_id, Some(file_url))
                    .await?
                {
                    IssueOutcome::Issued(certificate) => {
                        issued_certificate_id = Some(certificate.certificate_id);
                    }
                    IssueOutcome::AlreadyIssued => {
                        return Ok(ProcessOutcome::CertificateIneligible(
                            "Certificate already issued for this registration",
                        ));
                    }
                    IssueOutcome::NotCheckedIn => {
                        return Ok(ProcessOutcome::CertificateIneligible(
                            "Registration was never checked in",
                        ));
                    }
                    IssueOutcome::CertificatesDisabled => {
                        return Ok(ProcessOutcome::CertificateIneligible(
                            "Certificates are not enabled for this event",
                        ));
                    }
                    IssueOutcome::RegistrationNotFound => {
                        return Ok(ProcessOutcome::CertificateIneligible(
                            "Registration no longer exists",
                        ));
                    }
                }
            }
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE document_requests
            SET status = $2,
                admin_notes = COALESCE($3, admin_notes),
                file_url = COALESCE($4, file_url),
                processed_by = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(payload.status.as_str())
        .bind(&payload.admin_notes)
        .bind(&payload.file_url)
        .bind(processed_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let request = row_to_document(&row);
        info!(
            "Document request {} moved to {} by {}",
            id,
            request.status.as_str(),
            processed_by
        );

        Ok(ProcessOutcome::Processed {
            request,
            issued_certificate_id,
        })
    }
}
