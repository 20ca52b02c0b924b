//! Event model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(EventStatus::Draft),
            "published" => Some(EventStatus::Published),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

/// Event entity
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub registered_count: i32,
    pub status: EventStatus,
    pub certificate_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Seats still available for registration
    pub fn seats_remaining(&self) -> i32 {
        (self.capacity - self.registered_count).max(0)
    }

    /// Whether the event has already started at the given instant
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now
    }
}

/// Event creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub status: Option<EventStatus>,
    pub certificate_enabled: Option<bool>,
}

/// Event update payload; absent fields are left unchanged
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub status: Option<EventStatus>,
    pub certificate_enabled: Option<bool>,
}

/// Query parameters for the event listing
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EventQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    /// When true, only events that have not yet started
    pub upcoming: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(capacity: i32, registered: i32) -> Event {
        Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Intro to Rust".to_string(),
            description: String::new(),
            category: "workshop".to_string(),
            venue: "Hall A".to_string(),
            starts_at: Utc::now() + Duration::days(1),
            ends_at: None,
            capacity,
            registered_count: registered,
            status: EventStatus::Published,
            certificate_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            EventStatus::Draft,
            EventStatus::Published,
            EventStatus::Cancelled,
        ] {
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EventStatus::parse("archived"), None);
    }

    #[test]
    fn test_seats_remaining_never_negative() {
        assert_eq!(sample_event(100, 40).seats_remaining(), 60);
        assert_eq!(sample_event(10, 10).seats_remaining(), 0);
        // The database CHECK keeps registered_count <= capacity; clamp anyway.
        assert_eq!(sample_event(10, 12).seats_remaining(), 0);
    }

    #[test]
    fn test_has_started() {
        let mut event = sample_event(10, 0);
        assert!(!event.has_started(Utc::now()));

        event.starts_at = Utc::now() - Duration::hours(1);
        assert!(event.has_started(Utc::now()));
    }
}
