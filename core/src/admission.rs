//! Admission rules for new reservations.
//!
//! The check runs against a snapshot of the exam and reserves nothing. The
//! hard capacity guard is the confirmation commit.

use crate::error::{AdmissionRule, ReservationError, Result};
use crate::types::Exam;
use chrono::{DateTime, Duration, Utc};

/// Days before the exam date after which new reservations are refused
pub const DEFAULT_DEADLINE_DAYS: i64 = 3;

/// Validates reservation requests against an exam
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionValidator {
    deadline: Duration,
}

impl Default for AdmissionValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionValidator {
    /// Validator with the default three-day deadline
    #[must_use]
    pub fn new() -> Self {
        Self::with_deadline(Duration::days(DEFAULT_DEADLINE_DAYS))
    }

    /// Validator with a custom deadline window
    #[must_use]
    pub const fn with_deadline(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Deadline window
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Last instant at which a reservation for `exam` is still accepted
    #[must_use]
    pub fn deadline_for(&self, exam: &Exam) -> DateTime<Utc> {
        exam.date - self.deadline
    }

    /// Checks the people, deadline and capacity rules in that order.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::ReservationValidation` naming the first
    /// rule that failed.
    pub fn validate(&self, exam: &Exam, people: u32, now: DateTime<Utc>) -> Result<()> {
        if people == 0 {
            return Err(ReservationError::validation(AdmissionRule::People));
        }
        if now > self.deadline_for(exam) {
            return Err(ReservationError::validation(AdmissionRule::Deadline));
        }
        if !exam.has_room_for(people) {
            return Err(ReservationError::validation(AdmissionRule::Capacity));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{ExamId, MemberId};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn exam_at(date: DateTime<Utc>, current: u32, max: u32) -> Exam {
        Exam {
            id: ExamId::new(),
            owner_id: MemberId::new(),
            description: "Operating systems final".into(),
            date,
            current_people: current,
            max_people: max,
            created_at: now(),
            modified_at: now(),
        }
    }

    #[test]
    fn test_deadline_boundary_is_inclusive() {
        let validator = AdmissionValidator::new();
        let exam = exam_at(now() + Duration::days(3), 0, 10);
        assert_eq!(validator.validate(&exam, 1, now()), Ok(()));
        assert_eq!(
            validator.validate(&exam, 1, now() + Duration::seconds(1)),
            Err(ReservationError::validation(AdmissionRule::Deadline))
        );
    }

    #[test]
    fn test_capacity_equal_passes_over_fails() {
        let validator = AdmissionValidator::new();
        let exam = exam_at(now() + Duration::days(10), 10, 50);
        assert_eq!(validator.validate(&exam, 40, now()), Ok(()));
        assert_eq!(
            validator.validate(&exam, 41, now()),
            Err(ReservationError::validation(AdmissionRule::Capacity))
        );
    }

    #[test]
    fn test_zero_people_rejected_first() {
        let validator = AdmissionValidator::new();
        let exam = exam_at(now() - Duration::days(1), 50, 50);
        assert_eq!(
            validator.validate(&exam, 0, now()),
            Err(ReservationError::validation(AdmissionRule::People))
        );
    }

    #[test]
    fn test_custom_deadline() {
        let validator = AdmissionValidator::with_deadline(Duration::days(1));
        let exam = exam_at(now() + Duration::days(2), 0, 10);
        assert_eq!(validator.validate(&exam, 1, now()), Ok(()));
        assert_eq!(validator.deadline_for(&exam), now() + Duration::days(1));
    }
}
