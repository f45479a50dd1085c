//! Capacity ledger.
//!
//! An exam's `current_people` only moves through a [`LedgerEffect`]. The
//! reservation reducer emits effects and the storage layer applies them in
//! the same unit of work as the reservation write.

use crate::error::{ReservationError, Result};
use crate::types::{Exam, ExamId};
use chrono::{DateTime, Utc};

/// A change to an exam's occupancy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEffect {
    /// Consume seats
    Debit {
        /// Exam whose seats are consumed
        exam_id: ExamId,
        /// Seat count
        people: u32,
    },
    /// Release seats
    Credit {
        /// Exam whose seats are released
        exam_id: ExamId,
        /// Seat count
        people: u32,
    },
}

impl LedgerEffect {
    /// Builds the effect for a signed seat delta, `None` for zero
    #[must_use]
    pub fn from_delta(exam_id: ExamId, delta: i64) -> Option<Self> {
        let people = u32::try_from(delta.unsigned_abs()).ok()?;
        match delta {
            0 => None,
            d if d > 0 => Some(Self::Debit { exam_id, people }),
            _ => Some(Self::Credit { exam_id, people }),
        }
    }

    /// Exam the effect targets
    #[must_use]
    pub const fn exam_id(&self) -> ExamId {
        match self {
            Self::Debit { exam_id, .. } | Self::Credit { exam_id, .. } => *exam_id,
        }
    }

    /// Signed change to `current_people`
    #[must_use]
    pub fn delta(&self) -> i64 {
        match self {
            Self::Debit { people, .. } => i64::from(*people),
            Self::Credit { people, .. } => -i64::from(*people),
        }
    }

    /// Metric label
    #[must_use]
    pub const fn direction(&self) -> &'static str {
        match self {
            Self::Debit { .. } => "debit",
            Self::Credit { .. } => "credit",
        }
    }
}

impl Exam {
    /// Seats still available; zero when the exam is at or over capacity
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.max_people.saturating_sub(self.current_people)
    }

    /// Whether `people` more seats fit
    #[must_use]
    pub const fn has_room_for(&self, people: u32) -> bool {
        self.remaining() >= people
    }

    /// Returns a copy with `delta` added to `current_people`.
    ///
    /// Does not compare against `max_people`.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Internal` if the result would be negative
    /// or not representable.
    pub fn with_delta(&self, delta: i64, now: DateTime<Utc>) -> Result<Self> {
        let next = i64::from(self.current_people) + delta;
        let current_people = u32::try_from(next).map_err(|_| {
            ReservationError::Internal(format!(
                "ledger for exam {} would move to {next}",
                self.id
            ))
        })?;
        Ok(Self {
            current_people,
            modified_at: now,
            ..self.clone()
        })
    }

    /// Applies an effect, rejecting debits that overshoot `max_people`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - A debit has no room → `ReservationError::ExamCapacityExceeded`
    /// - The credit would go below zero → `ReservationError::Internal`
    pub fn apply(&self, effect: &LedgerEffect, now: DateTime<Utc>) -> Result<Self> {
        if let LedgerEffect::Debit { people, .. } = effect {
            if !self.has_room_for(*people) {
                return Err(ReservationError::ExamCapacityExceeded { exam_id: self.id });
            }
        }
        self.with_delta(effect.delta(), now)
    }
}
