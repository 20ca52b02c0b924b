//! Certificate model and identifier generation

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

/// Certificate entity
///
/// Immutable once issued except for `downloaded_at`.
#[derive(Debug, Clone, Serialize)]
pub struct Certificate {
    pub certificate_id: String,
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub verification_code: String,
    pub certificate_url: String,
    pub issued_at: DateTime<Utc>,
    pub downloaded_at: Option<DateTime<Utc>>,
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 output is ASCII")
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..36)] as char)
        .collect()
}

/// Generate a certificate identifier: `CERT-<random base36>-<timestamp base36>`
pub fn generate_certificate_id(now: DateTime<Utc>) -> String {
    format!(
        "CERT-{}-{}",
        random_base36(6).to_uppercase(),
        to_base36(now.timestamp_millis() as u64).to_uppercase()
    )
}

/// Generate a verification code: `VC-<random base36>-<timestamp base36>`
pub fn generate_verification_code(now: DateTime<Utc>) -> String {
    format!(
        "VC-{}-{}",
        random_base36(8).to_uppercase(),
        to_base36(now.timestamp_millis() as u64).to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(36 * 36), "100");
    }

    #[test]
    fn test_certificate_id_format() {
        let id = generate_certificate_id(Utc::now());
        let parts: Vec<&str> = id.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CERT");
        assert_eq!(parts[1].len(), 6);
        assert!(
            parts[1..]
                .iter()
                .all(|p| p.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()))
        );
    }

    #[test]
    fn test_verification_code_format() {
        let code = generate_verification_code(Utc::now());
        assert!(code.starts_with("VC-"));
        assert_eq!(code.split('-').count(), 3);
    }

    #[test]
    fn test_generated_ids_do_not_collide() {
        let now = Utc::now();
        let ids: HashSet<String> = (0..1000).map(|_| generate_certificate_id(now)).collect();
        // Same timestamp, distinct random components.
        assert_eq!(ids.len(), 1000);
    }
}
