//! Error types for password hashing and token operations.

use exam_reservation_core::ReservationError;
use thiserror::Error;

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failures of the hashing and token primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Passwords
    // ═══════════════════════════════════════════════════════════
    /// Stored hash is not in `pbkdf2_sha256$rounds$salt$hash` form.
    #[error("Malformed password hash")]
    MalformedHash,

    /// Configured round count is unusable.
    #[error("Invalid PBKDF2 round count: {0}")]
    InvalidRounds(u32),

    // ═══════════════════════════════════════════════════════════
    // Tokens
    // ═══════════════════════════════════════════════════════════
    /// Signing secret is empty.
    #[error("Token signing secret must not be empty")]
    MissingSecret,

    /// Token could not be encoded.
    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),

    /// Token failed signature or structure checks.
    #[error("Token rejected: {0}")]
    TokenRejected(String),

    /// Token is past its expiry.
    #[error("Token expired")]
    TokenExpired,
}

impl From<AuthError> for ReservationError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenRejected(_) | AuthError::TokenExpired => Self::TokenValidation,
            AuthError::MalformedHash
            | AuthError::InvalidRounds(_)
            | AuthError::MissingSecret
            | AuthError::TokenEncoding(_) => Self::Internal(err.to_string()),
        }
    }
}
