//! Shared authentication and authorization interface
//!
//! Token verification previously lived in each service's own middleware,
//! which duplicated the claims structure and key handling. This module is
//! the single implementation: services construct a [`TokenVerifier`] once
//! at startup and inject it through their application state.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// JWT claims carried by CampusHub tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User role (student or organizer)
    pub role: String,
    /// Display name, carried for convenience in UI-facing responses
    pub name: String,
    /// Account email, snapshotted into document requests
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Organizer,
}

impl Role {
    /// Parse a role string, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "organizer" => Some(Role::Organizer),
            _ => None,
        }
    }

    /// Canonical lowercase form stored in the database and token claims
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Organizer => "organizer",
        }
    }
}

/// Authenticated principal extracted from a validated access token
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl Principal {
    /// Check whether this principal holds one of the allowed roles
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Token verifier holding the RS256 public key
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier from a PEM-encoded RSA public key
    pub fn new(public_key_pem: &str) -> Result<Self, AuthError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| AuthError::Configuration(format!("Invalid public key: {}", e)))?;
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_exp = true;

        Ok(TokenVerifier {
            decoding_key,
            validation,
        })
    }

    /// Create a verifier from the `JWT_PUBLIC_KEY` environment variable
    ///
    /// The variable holds either the PEM text itself or a path to a PEM
    /// file, resolved against the current directory first and the crate
    /// root second.
    pub fn from_env() -> Result<Self, AuthError> {
        let public_key = std::env::var("JWT_PUBLIC_KEY").map_err(|_| {
            AuthError::Configuration("JWT_PUBLIC_KEY environment variable not set".to_string())
        })?;

        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .map_err(|e| {
                    AuthError::Configuration(format!("Failed to read public key file: {}", e))
                })?
                .trim()
                .to_string()
        };

        Self::new(&public_key)
    }

    /// Validate a raw token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(token_data.claims)
    }

    /// Authenticate a bearer access token into a [`Principal`]
    ///
    /// Rejects refresh tokens and unknown role claims. Role comparison is
    /// case-insensitive per the API contract.
    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken);
        }

        let role = Role::parse(&claims.role).ok_or(AuthError::InvalidToken)?;

        Ok(Principal {
            user_id: claims.sub,
            role,
            name: claims.name,
            email: claims.email,
        })
    }

    /// Authorize a principal against a set of allowed roles
    pub fn authorize(&self, principal: &Principal, allowed: &[Role]) -> Result<(), AuthError> {
        if principal.has_any_role(allowed) {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole(
                principal.role.as_str().to_string(),
            ))
        }
    }
}

/// Extract the bearer token from an `Authorization` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse("Student"), Some(Role::Student));
        assert_eq!(Role::parse("ORGANIZER"), Some(Role::Organizer));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_principal_role_check() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Student,
            name: "Ada".to_string(),
            email: "ada@university.edu".to_string(),
        };

        assert!(principal.has_any_role(&[Role::Student]));
        assert!(principal.has_any_role(&[Role::Student, Role::Organizer]));
        assert!(!principal.has_any_role(&[Role::Organizer]));
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token(""), None);
    }
}
