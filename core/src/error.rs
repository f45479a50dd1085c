//! Error types for exam reservation operations.

use crate::types::{ExamId, MemberId, ReservationId, ReservationStatus};
use std::fmt;
use thiserror::Error;

/// Result type alias for reservation operations.
pub type Result<T> = std::result::Result<T, ReservationError>;

/// Which admission rule rejected a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionRule {
    /// Seat count must be at least one
    People,
    /// Request arrived after the reservation deadline
    Deadline,
    /// Not enough seats left on the exam
    Capacity,
}

impl fmt::Display for AdmissionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::People => f.write_str("at least one seat must be requested"),
            Self::Deadline => f.write_str("the reservation deadline has passed"),
            Self::Capacity => f.write_str("not enough seats remain"),
        }
    }
}

/// Coarse classification used by callers to decide how to react
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Business rule violation, caller may retry with different input
    Validation,
    /// Referenced entity is absent
    NotFound,
    /// Caller lacks permission or credentials
    Authorization,
    /// Request conflicts with the current state
    Conflict,
    /// Storage or infrastructure failure
    Internal,
}

/// Error taxonomy for the reservation system.
///
/// Every variant carries a stable boundary code (see [`ReservationError::code`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    // ═══════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════
    /// Reservation request failed an admission rule.
    #[error("Reservation data validation failed: {rule}")]
    ReservationValidation {
        /// Rule that rejected the request
        rule: AdmissionRule,
    },

    /// Exam input is invalid.
    #[error("Exam validation failed: {reason}")]
    ExamValidation {
        /// What was wrong
        reason: String,
    },

    /// Member input is invalid.
    #[error("Member validation failed: {reason}")]
    MemberValidation {
        /// What was wrong
        reason: String,
    },

    /// Exam has no room for the requested seats.
    #[error("Exam {exam_id} capacity has been exceeded")]
    ExamCapacityExceeded {
        /// Exam whose capacity would be exceeded
        exam_id: ExamId,
    },

    // ═══════════════════════════════════════════════════════════
    // Not found
    // ═══════════════════════════════════════════════════════════
    /// Reservation does not exist.
    #[error("Not found reservation: {detail}")]
    ReservationNotFound {
        /// How the reservation was looked up
        detail: String,
    },

    /// Exam does not exist.
    #[error("Not found exam: {0}")]
    ExamNotFound(ExamId),

    /// Member does not exist.
    #[error("Not found member: {0}")]
    MemberNotFound(MemberId),

    // ═══════════════════════════════════════════════════════════
    // Authorization
    // ═══════════════════════════════════════════════════════════
    /// Caller is neither the owner nor an admin.
    #[error("Not allowed request, check your authentication")]
    NotAllowed,

    /// Operation is restricted to admins.
    #[error("Not enough permissions")]
    AdminRequired,

    /// Username or password is wrong.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// Bearer token is missing, malformed, expired, or names a deleted member.
    #[error("Token validation failed, not authenticated")]
    TokenValidation,

    // ═══════════════════════════════════════════════════════════
    // Conflict
    // ═══════════════════════════════════════════════════════════
    /// Username is already registered.
    #[error("Username already registered: {0}")]
    UsernameTaken(String),

    /// Status transition is not defined by the lifecycle.
    #[error("Cannot transition reservation from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: ReservationStatus,
        /// Requested status
        to: ReservationStatus,
    },

    /// Reservation changed between read and commit.
    #[error("Reservation {0} was modified concurrently")]
    ConcurrentModification(ReservationId),

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════
    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invariant broken or collaborator failed unexpectedly.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReservationError {
    /// Reservation lookup by id failed
    #[must_use]
    pub fn reservation_not_found(id: ReservationId) -> Self {
        Self::ReservationNotFound {
            detail: format!("id={id}"),
        }
    }

    /// Admission rule failure
    #[must_use]
    pub const fn validation(rule: AdmissionRule) -> Self {
        Self::ReservationValidation { rule }
    }

    /// Stable code surfaced to API clients
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ReservationValidation { .. } => "RESERVATION_VALIDATION_ERROR",
            Self::ExamValidation { .. } => "EXAM_VALIDATION_ERROR",
            Self::MemberValidation { .. } => "MEMBER_VALIDATION_ERROR",
            Self::ExamCapacityExceeded { .. } => "EXAM_CAPACITY_EXCEEDED",
            Self::ReservationNotFound { .. } => "RESERVATION_NOT_FOUND",
            Self::ExamNotFound(_) => "EXAM_NOT_FOUND",
            Self::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            Self::NotAllowed | Self::AdminRequired => "NOT_ALLOWED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenValidation => "TOKEN_VALIDATION_FAILED",
            Self::UsernameTaken(_) => "USERNAME_TAKEN",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Coarse category of the error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ReservationValidation { .. }
            | Self::ExamValidation { .. }
            | Self::MemberValidation { .. }
            | Self::ExamCapacityExceeded { .. }
            | Self::UsernameTaken(_) => ErrorCategory::Validation,
            Self::ReservationNotFound { .. } | Self::ExamNotFound(_) | Self::MemberNotFound(_) => {
                ErrorCategory::NotFound
            },
            Self::NotAllowed
            | Self::AdminRequired
            | Self::InvalidCredentials
            | Self::TokenValidation => ErrorCategory::Authorization,
            Self::InvalidStatusTransition { .. } | Self::ConcurrentModification(_) => {
                ErrorCategory::Conflict
            },
            Self::Storage(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}
