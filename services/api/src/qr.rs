//! Signed QR check-in tokens
//!
//! A check-in token is `base64url(payload_json) . base64url(hmac)` where the
//! MAC is HMAC-SHA256 over the exact payload bytes, keyed by a server-side
//! secret. The MAC is verified before any payload field is trusted, so a
//! client cannot forge or alter a token. Rendering tokens into QR images is
//! left to the frontend.

use anyhow::Result;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Payload carried inside a check-in QR token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QrPayload {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    /// Human-displayable fragment of the registration id. Shown at the desk
    /// for manual lookup; not a credential.
    pub check_in_code: String,
    /// Unix timestamp at token issue time
    pub issued_at: i64,
}

/// Errors produced while decoding a check-in token
#[derive(Error, Debug, PartialEq)]
pub enum QrError {
    /// Token structure or payload JSON could not be parsed
    #[error("Malformed QR payload")]
    Malformed,

    /// MAC did not verify; the token was tampered with or signed elsewhere
    #[error("QR signature mismatch")]
    SignatureMismatch,
}

/// Signer/verifier for check-in tokens
#[derive(Clone)]
pub struct QrSigner {
    key: Vec<u8>,
}

impl QrSigner {
    /// Create a signer from a raw secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: secret.to_vec(),
        }
    }

    /// Create a signer from the `QR_SIGNING_SECRET` environment variable
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("QR_SIGNING_SECRET")
            .map_err(|_| anyhow::anyhow!("QR_SIGNING_SECRET environment variable not set"))?;

        if secret.len() < 16 {
            anyhow::bail!("QR_SIGNING_SECRET must be at least 16 bytes");
        }

        Ok(Self::new(secret.as_bytes()))
    }

    fn mac(&self, message: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    /// Encode a payload into a signed token
    pub fn encode(&self, payload: &QrPayload) -> Result<String> {
        let json = serde_json::to_vec(payload)?;
        let tag = self.mac(&json);

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&json),
            URL_SAFE_NO_PAD.encode(&tag)
        ))
    }

    /// Decode and verify a token, returning the trusted payload
    pub fn decode(&self, token: &str) -> Result<QrPayload, QrError> {
        let (payload_part, tag_part) = token.split_once('.').ok_or(QrError::Malformed)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| QrError::Malformed)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_part)
            .map_err(|_| QrError::Malformed)?;

        // Constant-time comparison; verify before parsing so no untrusted
        // bytes reach serde.
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(&json);
        mac.verify_slice(&tag)
            .map_err(|_| QrError::SignatureMismatch)?;

        serde_json::from_slice(&json).map_err(|_| QrError::Malformed)
    }
}

/// Derive the displayable check-in code for a registration
///
/// The tail of the registration id, uppercased. Purely cosmetic.
pub fn check_in_code(registration_id: Uuid) -> String {
    let simple = registration_id.simple().to_string();
    simple[simple.len() - 8..].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn signer() -> QrSigner {
        QrSigner::new(b"test-secret-at-least-16-bytes")
    }

    fn payload() -> QrPayload {
        let registration_id = Uuid::new_v4();
        QrPayload {
            registration_id,
            event_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            student_name: "Ada Lovelace".to_string(),
            check_in_code: check_in_code(registration_id),
            issued_at: Utc::now().timestamp(),
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let signer = signer();
        let payload = payload();

        let token = signer.encode(&payload).unwrap();
        let decoded = signer.decode(&token).unwrap();

        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let signer = signer();
        let token = signer.encode(&payload()).unwrap();

        // Re-encode a different payload under the same tag.
        let (_, tag) = token.split_once('.').unwrap();
        let forged_json = serde_json::to_vec(&payload()).unwrap();
        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(&forged_json), tag);

        assert_eq!(signer.decode(&forged), Err(QrError::SignatureMismatch));
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let token = signer().encode(&payload()).unwrap();
        let other = QrSigner::new(b"another-secret-16-bytes-long");

        assert_eq!(other.decode(&token), Err(QrError::SignatureMismatch));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let signer = signer();

        assert_eq!(signer.decode(""), Err(QrError::Malformed));
        assert_eq!(signer.decode("no-separator"), Err(QrError::Malformed));
        assert_eq!(signer.decode("!!!.###"), Err(QrError::Malformed));
    }

    #[test]
    fn test_valid_mac_over_garbage_json_is_malformed() {
        let signer = signer();
        let garbage = b"not json at all";
        let tag = signer.mac(garbage);
        let token = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(garbage),
            URL_SAFE_NO_PAD.encode(&tag)
        );

        assert_eq!(signer.decode(&token), Err(QrError::Malformed));
    }

    #[test]
    fn test_check_in_code_shape() {
        let id = Uuid::new_v4();
        let code = check_in_code(id);

        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        // Deterministic for the same registration.
        assert_eq!(code, check_in_code(id));
    }
}
