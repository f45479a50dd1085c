//! Environment module - Dependency injection traits
//!
//! Every collaborator the services need is abstracted behind a trait here and
//! injected as `Arc<dyn Trait>`. Production implementations live in the
//! `exam-reservation-postgres` and `exam-reservation-auth` crates; in-memory
//! ones live in `exam-reservation-testing`.

use crate::error::Result;
use crate::ledger::LedgerEffect;
use crate::types::{
    Exam, ExamId, Member, MemberId, Reservation, ReservationHistoryEntry, ReservationId,
    ReservationVersion, Role,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use exam_reservation_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let earlier = clock.now();
/// assert!(clock.now() >= earlier);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by `Utc::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Member persistence.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Get member by ID.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>>;

    /// Get member by username.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_by_username(&self, username: &str) -> Result<Option<Member>>;

    /// Insert a new member.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Username already exists → `ReservationError::UsernameTaken`
    /// - Query fails → `ReservationError::Storage`
    async fn insert(&self, member: &Member) -> Result<Member>;

    /// Overwrite an existing member.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Member not found → `ReservationError::MemberNotFound`
    /// - New username already exists → `ReservationError::UsernameTaken`
    /// - Query fails → `ReservationError::Storage`
    async fn update(&self, member: &Member) -> Result<Member>;

    /// Delete a member, returning whether a row was removed.
    ///
    /// The member's reservations go with it; seats held by CONFIRMED ones
    /// are credited back to their exams in the same unit of work, stamped
    /// with `now`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The member still owns exams → `ReservationError::MemberValidation`
    /// - Query fails → `ReservationError::Storage`
    async fn delete(&self, id: MemberId, now: DateTime<Utc>) -> Result<bool>;
}

/// Exam persistence, including the capacity ledger primitive.
#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// Get exam by ID.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_by_id(&self, id: ExamId) -> Result<Option<Exam>>;

    /// List all exams ordered by date.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_all(&self) -> Result<Vec<Exam>>;

    /// List exams created by a member.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_by_owner(&self, owner_id: MemberId) -> Result<Vec<Exam>>;

    /// Insert a new exam.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn insert(&self, exam: &Exam) -> Result<Exam>;

    /// Delete an exam and its reservations, returning whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn delete(&self, id: ExamId) -> Result<bool>;

    /// Add `delta` to the exam's `current_people` and return the updated exam.
    ///
    /// Positive deltas consume seats, negative deltas release them. The
    /// primitive does not compare against `max_people`; callers guard.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Exam not found → `ReservationError::ExamNotFound`
    /// - Query fails → `ReservationError::Storage`
    async fn apply_delta(&self, id: ExamId, delta: i64, now: DateTime<Utc>) -> Result<Exam>;
}

/// Reservation persistence.
///
/// `commit` and `delete` apply the reservation write and its ledger effects
/// as one atomic unit. Implementations must lock the stored row and check
/// that its [`ReservationVersion`] still equals the one the effects were
/// computed from inside that unit.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Get reservation by ID.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// List a member's reservations, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Reservation>>;

    /// Get the oldest reservation a member holds for an exam.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn find_by_exam_and_member(
        &self,
        exam_id: ExamId,
        member_id: MemberId,
    ) -> Result<Option<Reservation>>;

    /// Insert a new reservation.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Exam not found → `ReservationError::ExamNotFound`
    /// - Query fails → `ReservationError::Storage`
    async fn insert(&self, reservation: &Reservation) -> Result<Reservation>;

    /// Persist a modified reservation together with its ledger effects.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Reservation not found → `ReservationError::ReservationNotFound`
    /// - Stored version differs from `expected` → `ReservationError::ConcurrentModification`
    /// - A debit would overshoot capacity → `ReservationError::ExamCapacityExceeded`
    /// - Query fails → `ReservationError::Storage`
    async fn commit(
        &self,
        reservation: &Reservation,
        expected: ReservationVersion,
        effects: &[LedgerEffect],
    ) -> Result<Reservation>;

    /// Delete a reservation together with its ledger effects.
    ///
    /// The stored version must still equal `reservation.version()`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Reservation not found → `ReservationError::ReservationNotFound`
    /// - Stored version differs → `ReservationError::ConcurrentModification`
    /// - Query fails → `ReservationError::Storage`
    async fn delete(
        &self,
        reservation: &Reservation,
        effects: &[LedgerEffect],
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// History entries of a reservation, oldest first.
    ///
    /// `insert` and `commit` each append one entry in the same unit of work.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    async fn history(&self, reservation_id: ReservationId) -> Result<Vec<ReservationHistoryEntry>>;
}

/// Liveness of the storage backend, used by readiness checks.
#[async_trait]
pub trait StorageHealth: Send + Sync {
    /// Round-trip to the backend.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the backend is unreachable.
    async fn ping(&self) -> Result<()>;
}

/// Password storage primitive.
///
/// CPU-heavy implementations must run off the async worker threads.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plain-text password into an opaque, self-describing string.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Internal` if hashing fails.
    async fn hash(&self, password: &str) -> Result<String>;

    /// Check a plain-text password against a stored hash.
    async fn verify(&self, hash: &str, password: &str) -> bool;
}

/// Claims carried by an access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Member the token was issued to
    pub member_id: MemberId,
    /// Username at issue time
    pub username: String,
    /// Role at issue time
    pub role: Role,
    /// Expiry
    pub expires_at: DateTime<Utc>,
}

/// A bearer token handed out on login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    /// Encoded token
    pub access_token: String,
    /// Always `bearer`
    pub token_type: &'static str,
    /// Expiry
    pub expires_at: DateTime<Utc>,
}

/// Access-token issuance and verification.
pub trait TokenIssuer: Send + Sync {
    /// Issue a token for a member.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Internal` if encoding fails.
    fn issue(&self, member: &Member, now: DateTime<Utc>) -> Result<AccessToken>;

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::TokenValidation` if the token is malformed,
    /// has a bad signature, or has expired.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims>;
}
