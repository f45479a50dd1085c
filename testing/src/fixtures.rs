//! Fixtures for members, exams and reservations.
//!
//! Timestamps come from [`test_clock`](crate::test_clock), so fixtures line
//! up with services driven by the default test clock. Members are created
//! with the password `password`, hashed by [`PlaintextHasher`](crate::PlaintextHasher).

use crate::mocks::test_clock;
use chrono::{DateTime, Duration, Utc};
use exam_reservation_core::environment::Clock;
use exam_reservation_core::types::{
    DEFAULT_MAX_PEOPLE, Exam, ExamId, Member, MemberId, Reservation, Role,
};

/// Password every fixture member is created with
pub const PASSWORD: &str = "password";

fn now() -> DateTime<Utc> {
    test_clock().now()
}

/// A member with the given role
#[must_use]
pub fn member(username: &str, role: Role) -> Member {
    Member {
        id: MemberId::new(),
        username: username.to_string(),
        password_hash: format!("plain${PASSWORD}"),
        role,
        created_at: now(),
        modified_at: now(),
    }
}

/// An admin member
#[must_use]
pub fn admin(username: &str) -> Member {
    member(username, Role::Admin)
}

/// A regular member
#[must_use]
pub fn user(username: &str) -> Member {
    member(username, Role::User)
}

/// A PENDING reservation created at the test clock's time
#[must_use]
pub fn reservation(member_id: MemberId, exam_id: ExamId, people: u32) -> Reservation {
    Reservation::pending(member_id, exam_id, people, now())
}

/// Start building an exam owned by `owner_id`
///
/// Defaults: ten days after the test clock, empty, default capacity.
#[must_use]
pub fn exam(owner_id: MemberId) -> ExamBuilder {
    ExamBuilder {
        exam: Exam {
            id: ExamId::new(),
            owner_id,
            description: "Data structures final".to_string(),
            date: now() + Duration::days(10),
            current_people: 0,
            max_people: DEFAULT_MAX_PEOPLE,
            created_at: now(),
            modified_at: now(),
        },
    }
}

/// Builder for [`Exam`] fixtures
#[derive(Clone, Debug)]
pub struct ExamBuilder {
    exam: Exam,
}

impl ExamBuilder {
    /// Exam date
    #[must_use]
    pub const fn date(mut self, date: DateTime<Utc>) -> Self {
        self.exam.date = date;
        self
    }

    /// Exam date as an offset from the test clock
    #[must_use]
    pub fn in_days(self, days: i64) -> Self {
        self.date(now() + Duration::days(days))
    }

    /// Description
    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.exam.description = description.to_string();
        self
    }

    /// Initial occupancy
    #[must_use]
    pub const fn current_people(mut self, current: u32) -> Self {
        self.exam.current_people = current;
        self
    }

    /// Capacity
    #[must_use]
    pub const fn max_people(mut self, max: u32) -> Self {
        self.exam.max_people = max;
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> Exam {
        self.exam
    }
}
