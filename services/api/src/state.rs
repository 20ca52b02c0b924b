//! Application state shared across handlers

use common::auth::TokenVerifier;

use crate::{
    qr::QrSigner,
    repositories::{
        CertificateRepository, DocumentRepository, EventRepository, FeedbackRepository,
        NotificationRepository, RegistrationRepository,
    },
    suggestions::SuggestionClient,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub verifier: TokenVerifier,
    pub qr_signer: QrSigner,
    pub suggestion_client: SuggestionClient,
    pub event_repository: EventRepository,
    pub registration_repository: RegistrationRepository,
    pub certificate_repository: CertificateRepository,
    pub feedback_repository: FeedbackRepository,
    pub document_repository: DocumentRepository,
    pub notification_repository: NotificationRepository,
}
