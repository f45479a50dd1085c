//! Domain types for exam reservations.
//!
//! Identifiers, the three entities (`Member`, `Exam`, `Reservation`) and the
//! input structs that create or patch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(Uuid);

impl MemberId {
    /// Creates a new random `MemberId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `MemberId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an exam
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(Uuid);

impl ExamId {
    /// Creates a new random `ExamId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `ExamId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a reservation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random `ReservationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ReservationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Member role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Manages exams and approves reservations
    Admin,
    /// Regular member
    #[default]
    User,
}

impl Role {
    /// Storage and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Reservation status
///
/// ```text
/// PENDING ──confirm──▶ CONFIRMED
///    │
///    └────deny──────▶ DENIED
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Awaiting admin decision
    #[default]
    Pending,
    /// Approved, seats consumed on the exam
    Confirmed,
    /// Rejected
    Denied,
}

impl ReservationStatus {
    /// Storage and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Denied => "DENIED",
        }
    }

    /// CONFIRMED and DENIED have no outgoing transitions
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Denied)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "DENIED" => Ok(Self::Denied),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Returned when parsing a `Role` or `ReservationStatus` from an unknown string
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

// ============================================================================
// Entities
// ============================================================================

/// A registered member
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Unique member identifier
    pub id: MemberId,
    /// Login name, unique across members
    pub username: String,
    /// Opaque output of the password hasher
    pub password_hash: String,
    /// Role, read by the authorization guard
    pub role: Role,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

impl Member {
    /// Returns true for admins
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The subset of the member the authorization guard looks at
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
        }
    }
}

/// A member as exposed outside the service layer, without the password hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    /// Unique member identifier
    pub id: MemberId,
    /// Login name
    pub username: String,
    /// Role
    pub role: Role,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            username: member.username.clone(),
            role: member.role,
            created_at: member.created_at,
            modified_at: member.modified_at,
        }
    }
}

impl From<Member> for MemberView {
    fn from(member: Member) -> Self {
        Self::from(&member)
    }
}

/// The caller of an operation, as seen by the authorization guard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Member performing the call
    pub id: MemberId,
    /// Member's role at the time of the call
    pub role: Role,
}

impl Actor {
    /// Creates a new `Actor`
    #[must_use]
    pub const fn new(id: MemberId, role: Role) -> Self {
        Self { id, role }
    }

    /// Returns true for admins
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&Member> for Actor {
    fn from(member: &Member) -> Self {
        member.actor()
    }
}

/// A schedulable exam with a seat capacity
///
/// `current_people` and `max_people` form the capacity ledger; see
/// [`crate::ledger`] for the operations that move them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    /// Unique exam identifier
    pub id: ExamId,
    /// Admin who created the exam
    pub owner_id: MemberId,
    /// Free-form description
    pub description: String,
    /// When the exam takes place
    pub date: DateTime<Utc>,
    /// Seats consumed by confirmed reservations (plus any initial occupancy)
    pub current_people: u32,
    /// Seat capacity
    pub max_people: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

/// A member's request for seats at an exam
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation identifier
    pub id: ReservationId,
    /// Member who owns the reservation
    pub member_id: MemberId,
    /// Exam the seats are requested for
    pub exam_id: ExamId,
    /// Number of seats, at least one
    pub people: u32,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

impl Reservation {
    /// Creates a new PENDING reservation
    #[must_use]
    pub fn pending(
        member_id: MemberId,
        exam_id: ExamId,
        people: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            member_id,
            exam_id,
            people,
            status: ReservationStatus::Pending,
            created_at: now,
            modified_at: now,
        }
    }

    /// The fields this reservation's ledger effects were derived from
    #[must_use]
    pub const fn version(&self) -> ReservationVersion {
        ReservationVersion {
            status: self.status,
            people: self.people,
        }
    }
}

/// The part of a reservation its ledger effects depend on.
///
/// A write computed from a snapshot is only valid while the stored row still
/// has the snapshot's version; stores compare it under the row lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReservationVersion {
    /// Status as read
    pub status: ReservationStatus,
    /// Seat count as read
    pub people: u32,
}

impl fmt::Display for ReservationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.status, self.people)
    }
}

/// Unique identifier for a history entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(Uuid);

impl HistoryId {
    /// Creates a new random `HistoryId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `HistoryId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a reservation after one of its writes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationHistoryEntry {
    /// Unique entry identifier
    pub id: HistoryId,
    /// Owner of the reservation
    pub member_id: MemberId,
    /// Reservation the entry belongs to
    pub reservation_id: ReservationId,
    /// Seat count after the write
    pub people: u32,
    /// Status after the write
    pub status: ReservationStatus,
    /// When the write happened
    pub created_at: DateTime<Utc>,
}

impl ReservationHistoryEntry {
    /// Snapshot of `reservation` as of its last modification
    #[must_use]
    pub fn snapshot(reservation: &Reservation) -> Self {
        Self {
            id: HistoryId::new(),
            member_id: reservation.member_id,
            reservation_id: reservation.id,
            people: reservation.people,
            status: reservation.status,
            created_at: reservation.modified_at,
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Default seat capacity for a new exam
pub const DEFAULT_MAX_PEOPLE: u32 = 50_000;

/// Registration input
#[derive(Clone, Debug, Deserialize)]
pub struct NewMember {
    /// Requested login name
    pub username: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// Requested role
    #[serde(default)]
    pub role: Role,
}

/// Partial update of a member; only `Some` fields change
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MemberPatch {
    /// New login name
    pub username: Option<String>,
    /// New plain-text password
    pub password: Option<String>,
    /// New role (admin only)
    pub role: Option<Role>,
}

impl MemberPatch {
    /// Returns true when no field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.role.is_none()
    }
}

/// Exam creation input
#[derive(Clone, Debug, Deserialize)]
pub struct NewExam {
    /// When the exam takes place
    pub date: DateTime<Utc>,
    /// Free-form description
    pub description: String,
    /// Initial occupancy
    #[serde(default)]
    pub current_people: u32,
    /// Seat capacity
    #[serde(default = "default_max_people")]
    pub max_people: u32,
}

const fn default_max_people() -> u32 {
    DEFAULT_MAX_PEOPLE
}

/// Partial update of a reservation; only `Some` fields change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ReservationPatch {
    /// New seat count
    pub people: Option<u32>,
}

impl ReservationPatch {
    /// Returns true when no field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.people.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Denied,
        ] {
            assert_eq!(status.as_str().parse::<ReservationStatus>(), Ok(status));
        }
        assert!("CANCELLED".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ReservationStatus::Pending.is_terminal());
        assert!(ReservationStatus::Confirmed.is_terminal());
        assert!(ReservationStatus::Denied.is_terminal());
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!("USER".parse::<Role>(), Ok(Role::User));
    }

    #[test]
    fn test_new_exam_defaults() {
        let exam: NewExam = serde_json::from_str(
            r#"{"date":"2025-02-01T09:00:00Z","description":"Algorithms midterm"}"#,
        )
        .unwrap();
        assert_eq!(exam.current_people, 0);
        assert_eq!(exam.max_people, DEFAULT_MAX_PEOPLE);
    }
}
