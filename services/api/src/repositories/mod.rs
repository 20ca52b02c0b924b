//! Repositories for database operations

pub mod certificate;
pub mod document;
pub mod event;
pub mod feedback;
pub mod notification;
pub mod registration;

#[cfg(test)]
mod lifecycle_tests;

pub use certificate::CertificateRepository;
pub use document::DocumentRepository;
pub use event::EventRepository;
pub use feedback::FeedbackRepository;
pub use notification::NotificationRepository;
pub use registration::{RegistrationRepository, RegistrationWithStudent};
