//! Registration model and its state machine
//!
//! The status field is a closed enumeration with an explicit transition
//! table. Handlers never compare raw status strings; every state change
//! goes through [`RegistrationStatus::can_transition`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration lifecycle status
///
/// `Registered -> Attended` on check-in, `Registered -> Cancelled` on
/// cancellation. `Attended` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Attended,
    Cancelled,
}

impl RegistrationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(RegistrationStatus::Registered),
            "attended" => Some(RegistrationStatus::Attended),
            "cancelled" => Some(RegistrationStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Attended => "attended",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    /// Transition table for the registration state machine
    pub fn can_transition(&self, to: RegistrationStatus) -> bool {
        matches!(
            (self, to),
            (
                RegistrationStatus::Registered,
                RegistrationStatus::Attended
            ) | (
                RegistrationStatus::Registered,
                RegistrationStatus::Cancelled
            )
        )
    }

    /// Whether this state accepts no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RegistrationStatus::Registered)
    }
}

/// Registration entity
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub check_in_at: Option<DateTime<Utc>>,
    pub certificate_issued: bool,
    pub certificate_id: Option<String>,
}

impl Registration {
    /// Whether attendance has been confirmed
    pub fn has_attended(&self) -> bool {
        self.status == RegistrationStatus::Attended || self.check_in_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            RegistrationStatus::Registered,
            RegistrationStatus::Attended,
            RegistrationStatus::Cancelled,
        ] {
            assert_eq!(RegistrationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RegistrationStatus::parse("pending"), None);
    }

    #[test]
    fn test_transition_table() {
        use RegistrationStatus::*;

        assert!(Registered.can_transition(Attended));
        assert!(Registered.can_transition(Cancelled));

        // Terminal states accept nothing; attendance cannot be cancelled.
        assert!(!Attended.can_transition(Cancelled));
        assert!(!Attended.can_transition(Registered));
        assert!(!Cancelled.can_transition(Registered));
        assert!(!Cancelled.can_transition(Attended));
        assert!(!Registered.can_transition(Registered));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RegistrationStatus::Registered.is_terminal());
        assert!(RegistrationStatus::Attended.is_terminal());
        assert!(RegistrationStatus::Cancelled.is_terminal());
    }
}
