//! Document request model and its state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Requested document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Certificate,
    AttendanceLetter,
    Transcript,
    Other,
}

impl DocumentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "certificate" => Some(DocumentType::Certificate),
            "attendance-letter" => Some(DocumentType::AttendanceLetter),
            "transcript" => Some(DocumentType::Transcript),
            "other" => Some(DocumentType::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Certificate => "certificate",
            DocumentType::AttendanceLetter => "attendance-letter",
            DocumentType::Transcript => "transcript",
            DocumentType::Other => "other",
        }
    }
}

/// Document request processing status
///
/// `Pending -> Processing -> {Approved, Rejected, Completed}` and
/// `Approved -> Completed`. `Completed` and `Rejected` are terminal; a
/// processed request can never be re-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
    Completed,
}

impl DocumentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(DocumentStatus::Pending),
            "processing" => Some(DocumentStatus::Processing),
            "approved" => Some(DocumentStatus::Approved),
            "rejected" => Some(DocumentStatus::Rejected),
            "completed" => Some(DocumentStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Completed => "completed",
        }
    }

    /// Transition table for the document request state machine
    pub fn can_transition(&self, to: DocumentStatus) -> bool {
        use DocumentStatus::*;

        matches!(
            (self, to),
            (Pending, Processing)
                | (Processing, Approved)
                | (Processing, Rejected)
                | (Processing, Completed)
                | (Approved, Completed)
        )
    }

    /// Whether this state accepts no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Rejected)
    }
}

/// Document request entity
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRequest {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_email: String,
    pub event_id: Option<Uuid>,
    pub document_type: DocumentType,
    pub urgency: String,
    pub purpose: Option<String>,
    pub status: DocumentStatus,
    pub admin_notes: Option<String>,
    pub file_url: Option<String>,
    pub processed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document request creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewDocumentRequest {
    pub document_type: DocumentType,
    pub event_id: Option<Uuid>,
    pub urgency: Option<String>,
    pub purpose: Option<String>,
}

/// Admin processing payload
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessDocumentRequest {
    pub status: DocumentStatus,
    pub admin_notes: Option<String>,
    pub file_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_round_trip() {
        for ty in [
            DocumentType::Certificate,
            DocumentType::AttendanceLetter,
            DocumentType::Transcript,
            DocumentType::Other,
        ] {
            assert_eq!(DocumentType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(DocumentType::parse("diploma"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            DocumentStatus::Pending,
            DocumentStatus::Processing,
            DocumentStatus::Approved,
            DocumentStatus::Rejected,
            DocumentStatus::Completed,
        ] {
            assert_eq!(DocumentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_transition_table() {
        use DocumentStatus::*;

        assert!(Pending.can_transition(Processing));
        assert!(Processing.can_transition(Approved));
        assert!(Processing.can_transition(Rejected));
        assert!(Processing.can_transition(Completed));
        assert!(Approved.can_transition(Completed));

        // No skipping the queue.
        assert!(!Pending.can_transition(Completed));
        assert!(!Pending.can_transition(Approved));
        assert!(!Pending.can_transition(Rejected));
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        use DocumentStatus::*;

        for terminal in [Completed, Rejected] {
            assert!(terminal.is_terminal());
            for to in [Pending, Processing, Approved, Rejected, Completed] {
                assert!(!terminal.can_transition(to));
            }
        }
    }
}
