//! Custom error types for the common library
//!
//! This module defines infrastructure-level error types shared by the
//! CampusHub services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error type for the shared authentication interface
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token is missing, malformed, expired, or carries a bad signature
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token is valid but the principal lacks the required role
    #[error("Insufficient role: {0}")]
    InsufficientRole(String),

    /// Verifier could not be constructed from configuration
    #[error("Auth configuration error: {0}")]
    Configuration(String),
}
