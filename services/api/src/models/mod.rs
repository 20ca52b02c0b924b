//! Data models for the event API service

pub mod certificate;
pub mod document;
pub mod event;
pub mod feedback;
pub mod notification;
pub mod registration;

pub use certificate::Certificate;
pub use document::{DocumentRequest, DocumentStatus, DocumentType};
pub use event::{Event, EventStatus};
pub use feedback::Feedback;
pub use notification::Notification;
pub use registration::{Registration, RegistrationStatus};
