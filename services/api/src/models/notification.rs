//! Notification model

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Notification entity: one entry in a user's inbox
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub event_id: Option<Uuid>,
    pub registration_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Notification kinds written by domain triggers
pub mod kinds {
    pub const REGISTRATION_CONFIRMED: &str = "registration_confirmed";
    pub const CHECKED_IN: &str = "checked_in";
    pub const CERTIFICATE_ISSUED: &str = "certificate_issued";
    pub const DOCUMENT_PROCESSED: &str = "document_processed";
}
