//! Database-backed tests for the registration, certificate, and document
//! workflows. They need a provisioned PostgreSQL and are ignored by
//! default; run them with `cargo test -- --ignored`.

use chrono::{Duration, Utc};
use common::database::{DatabaseConfig, init_pool};
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::document::{DocumentStatus, DocumentType, NewDocumentRequest, ProcessDocumentRequest};
use crate::models::event::{EventStatus, NewEvent};
use crate::models::feedback::NewFeedback;
use crate::repositories::certificate::IssueOutcome;
use crate::repositories::document::ProcessOutcome;
use crate::repositories::feedback::FeedbackOutcome;
use crate::repositories::registration::{CancelOutcome, CheckInOutcome, RegisterOutcome};
use crate::repositories::{
    CertificateRepository, DocumentRepository, EventRepository, FeedbackRepository,
    RegistrationRepository,
};

async fn pool() -> PgPool {
    let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
    let pool = init_pool(&config).await.expect("database must be reachable");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrations must apply");
    pool
}

async fn create_user(pool: &PgPool, role: &str) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO users (full_name, email, password_hash, role)
        VALUES ($1, $2, 'not-a-real-hash', $3)
        RETURNING id
        "#,
    )
    .bind("Test User")
    .bind(format!("user-{}@campushub.test", Uuid::new_v4().simple()))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("user insert")
}

async fn create_event(
    pool: &PgPool,
    organizer_id: Uuid,
    capacity: i32,
    certificate_enabled: bool,
    starts_in_hours: i64,
) -> crate::models::Event {
    EventRepository::new(pool.clone())
        .create(
            organizer_id,
            &NewEvent {
                title: "Lifecycle Test Event".to_string(),
                description: None,
                category: Some("workshop".to_string()),
                venue: "Hall A".to_string(),
                starts_at: Utc::now() + Duration::hours(starts_in_hours),
                ends_at: None,
                capacity,
                status: Some(EventStatus::Published),
                certificate_enabled: Some(certificate_enabled),
            },
        )
        .await
        .expect("event insert")
}

fn feedback(rating: i32) -> NewFeedback {
    NewFeedback {
        rating,
        comment: Some("solid event".to_string()),
        suggestions: None,
        anonymous: false,
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires local PostgreSQL"]
async fn test_capacity_one_admits_exactly_one() {
    let pool = pool().await;
    let registrations = RegistrationRepository::new(pool.clone());
    let events = EventRepository::new(pool.clone());

    let organizer = create_user(&pool, "organizer").await;
    let first = create_user(&pool, "student").await;
    let second = create_user(&pool, "student").await;
    let event = create_event(&pool, organizer, 1, false, 24).await;

    assert!(matches!(
        registrations.register(event.id, first).await.unwrap(),
        RegisterOutcome::Created(_)
    ));
    assert!(matches!(
        registrations.register(event.id, second).await.unwrap(),
        RegisterOutcome::CapacityFull
    ));

    let event = events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(event.registered_count, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires local PostgreSQL"]
async fn test_register_checkin_certificate_feedback_flow() {
    let pool = pool().await;
    let registrations = RegistrationRepository::new(pool.clone());
    let certificates = CertificateRepository::new(pool.clone());
    let feedback_repo = FeedbackRepository::new(pool.clone());

    let organizer = create_user(&pool, "organizer").await;
    let student = create_user(&pool, "student").await;
    let bystander = create_user(&pool, "student").await;
    let event = create_event(&pool, organizer, 10, true, 24).await;

    let registration = match registrations.register(event.id, student).await.unwrap() {
        RegisterOutcome::Created(registration) => registration,
        other => panic!("expected Created, got {:?}", other),
    };
    assert!(matches!(
        registrations.register(event.id, student).await.unwrap(),
        RegisterOutcome::AlreadyRegistered
    ));

    assert!(matches!(
        registrations.check_in(registration.id).await.unwrap(),
        CheckInOutcome::CheckedIn(_)
    ));
    // Re-scan is a no-op, not an error.
    assert!(matches!(
        registrations.check_in(registration.id).await.unwrap(),
        CheckInOutcome::AlreadyCheckedIn(_)
    ));

    let certificate = match certificates.issue(registration.id, None).await.unwrap() {
        IssueOutcome::Issued(certificate) => certificate,
        other => panic!("expected Issued, got {:?}", other),
    };
    assert!(certificate.certificate_id.starts_with("CERT-"));
    assert!(matches!(
        certificates.issue(registration.id, None).await.unwrap(),
        IssueOutcome::AlreadyIssued
    ));

    let found = certificates
        .find_by_verification_code(&certificate.verification_code)
        .await
        .unwrap()
        .expect("certificate resolvable by code");
    assert_eq!(found.certificate_id, certificate.certificate_id);

    assert!(matches!(
        feedback_repo
            .submit(event.id, student, "Test User", &feedback(5))
            .await
            .unwrap(),
        FeedbackOutcome::Created(_)
    ));
    assert!(matches!(
        feedback_repo
            .submit(event.id, student, "Test User", &feedback(3))
            .await
            .unwrap(),
        FeedbackOutcome::Duplicate
    ));
    assert!(matches!(
        feedback_repo
            .submit(event.id, bystander, "Test User", &feedback(4))
            .await
            .unwrap(),
        FeedbackOutcome::NotAttended
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires local PostgreSQL"]
async fn test_cancel_frees_the_seat() {
    let pool = pool().await;
    let registrations = RegistrationRepository::new(pool.clone());
    let events = EventRepository::new(pool.clone());

    let organizer = create_user(&pool, "organizer").await;
    let first = create_user(&pool, "student").await;
    let second = create_user(&pool, "student").await;
    let event = create_event(&pool, organizer, 1, false, 24).await;

    assert!(matches!(
        registrations.register(event.id, first).await.unwrap(),
        RegisterOutcome::Created(_)
    ));
    assert!(matches!(
        registrations
            .cancel(event.id, first, Utc::now())
            .await
            .unwrap(),
        CancelOutcome::Cancelled
    ));

    let event_row = events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(event_row.registered_count, 0);

    // The cancelled row does not block another student, nor a
    // re-registration by the same one.
    assert!(matches!(
        registrations.register(event.id, second).await.unwrap(),
        RegisterOutcome::Created(_)
    ));
    assert!(matches!(
        registrations
            .cancel(event.id, second, Utc::now())
            .await
            .unwrap(),
        CancelOutcome::Cancelled
    ));
    assert!(matches!(
        registrations.register(event.id, first).await.unwrap(),
        RegisterOutcome::Created(_)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires local PostgreSQL"]
async fn test_cancellation_window_closes_at_start() {
    let pool = pool().await;
    let registrations = RegistrationRepository::new(pool.clone());

    let organizer = create_user(&pool, "organizer").await;
    let student = create_user(&pool, "student").await;
    let event = create_event(&pool, organizer, 5, false, -1).await;

    assert!(matches!(
        registrations.register(event.id, student).await.unwrap(),
        RegisterOutcome::Created(_)
    ));
    assert!(matches!(
        registrations
            .cancel(event.id, student, Utc::now())
            .await
            .unwrap(),
        CancelOutcome::EventStarted
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires local PostgreSQL"]
async fn test_certificate_eligibility_rules() {
    let pool = pool().await;
    let registrations = RegistrationRepository::new(pool.clone());
    let certificates = CertificateRepository::new(pool.clone());

    let organizer = create_user(&pool, "organizer").await;
    let student = create_user(&pool, "student").await;

    // Never checked in.
    let event = create_event(&pool, organizer, 5, true, 24).await;
    let registration = match registrations.register(event.id, student).await.unwrap() {
        RegisterOutcome::Created(registration) => registration,
        other => panic!("expected Created, got {:?}", other),
    };
    assert!(matches!(
        certificates.issue(registration.id, None).await.unwrap(),
        IssueOutcome::NotCheckedIn
    ));

    // Checked in, but the event never enabled certificates.
    let plain_event = create_event(&pool, organizer, 5, false, 24).await;
    let registration = match registrations.register(plain_event.id, student).await.unwrap() {
        RegisterOutcome::Created(registration) => registration,
        other => panic!("expected Created, got {:?}", other),
    };
    registrations.check_in(registration.id).await.unwrap();
    assert!(matches!(
        certificates.issue(registration.id, None).await.unwrap(),
        IssueOutcome::CertificatesDisabled
    ));

    assert!(matches!(
        certificates.issue(Uuid::new_v4(), None).await.unwrap(),
        IssueOutcome::RegistrationNotFound
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires local PostgreSQL"]
async fn test_document_request_state_machine() {
    let pool = pool().await;
    let registrations = RegistrationRepository::new(pool.clone());
    let documents = DocumentRepository::new(pool.clone());

    let organizer = create_user(&pool, "organizer").await;
    let student = create_user(&pool, "student").await;
    let event = create_event(&pool, organizer, 5, true, 24).await;

    let registration = match registrations.register(event.id, student).await.unwrap() {
        RegisterOutcome::Created(registration) => registration,
        other => panic!("expected Created, got {:?}", other),
    };
    registrations.check_in(registration.id).await.unwrap();

    let request = documents
        .create(
            student,
            "student@campushub.test",
            &NewDocumentRequest {
                document_type: DocumentType::Certificate,
                event_id: Some(event.id),
                urgency: None,
                purpose: Some("Scholarship application".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(request.status, DocumentStatus::Pending);

    let step = |status: DocumentStatus, file_url: Option<&str>| ProcessDocumentRequest {
        status,
        admin_notes: None,
        file_url: file_url.map(str::to_string),
    };

    // Pending cannot jump straight to a terminal state.
    assert!(matches!(
        documents
            .process(request.id, organizer, &step(DocumentStatus::Completed, None))
            .await
            .unwrap(),
        ProcessOutcome::IllegalTransition { .. }
    ));

    assert!(matches!(
        documents
            .process(request.id, organizer, &step(DocumentStatus::Processing, None))
            .await
            .unwrap(),
        ProcessOutcome::Processed { .. }
    ));

    // Completion without a file URL is rejected.
    assert!(matches!(
        documents
            .process(request.id, organizer, &step(DocumentStatus::Completed, None))
            .await
            .unwrap(),
        ProcessOutcome::MissingFileUrl
    ));

    let outcome = documents
        .process(
            request.id,
            organizer,
            &step(DocumentStatus::Completed, Some("/files/cert.pdf")),
        )
        .await
        .unwrap();
    let issued = match outcome {
        ProcessOutcome::Processed {
            issued_certificate_id,
            ..
        } => issued_certificate_id,
        other => panic!("expected Processed, got {:?}", other),
    };
    assert!(issued.is_some_and(|id| id.starts_with("CERT-")));

    // Terminal state: no further processing.
    assert!(matches!(
        documents
            .process(request.id, organizer, &step(DocumentStatus::Rejected, None))
            .await
            .unwrap(),
        ProcessOutcome::IllegalTransition { .. }
    ));
}
