//! Exam service: admin-managed exams and the ledger primitive.

use crate::authorization::require_admin;
use crate::environment::{Clock, ExamRepository};
use crate::error::{ReservationError, Result};
use crate::metrics;
use crate::types::{Actor, Exam, ExamId, MemberId, NewExam};
use std::sync::Arc;
use tracing::info;

/// Dependencies of the exam service
#[derive(Clone)]
pub struct ExamEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Exam store
    pub exams: Arc<dyn ExamRepository>,
}

impl ExamEnvironment {
    /// Creates a new environment
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, exams: Arc<dyn ExamRepository>) -> Self {
        Self { clock, exams }
    }
}

/// Exam operations
#[derive(Clone)]
pub struct ExamService {
    env: ExamEnvironment,
}

impl ExamService {
    /// Creates a new service
    #[must_use]
    pub const fn new(env: ExamEnvironment) -> Self {
        Self { env }
    }

    /// Creates an exam owned by the acting admin.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Actor is not an admin → `ReservationError::AdminRequired`
    /// - Description is blank or capacity is zero → `ReservationError::ExamValidation`
    /// - Initial occupancy exceeds capacity → `ReservationError::ExamCapacityExceeded`
    /// - Storage fails → `ReservationError::Storage`
    #[tracing::instrument(skip(self, input), fields(actor_id = %actor.id))]
    pub async fn create(&self, actor: &Actor, input: NewExam) -> Result<Exam> {
        require_admin(actor)?;

        let description = input.description.trim();
        if description.is_empty() {
            return Err(ReservationError::ExamValidation {
                reason: "description must not be empty".into(),
            });
        }
        if input.max_people == 0 {
            return Err(ReservationError::ExamValidation {
                reason: "max_people must be at least 1".into(),
            });
        }

        let now = self.env.clock.now();
        let exam = Exam {
            id: ExamId::new(),
            owner_id: actor.id,
            description: description.to_string(),
            date: input.date,
            current_people: input.current_people,
            max_people: input.max_people,
            created_at: now,
            modified_at: now,
        };
        if exam.current_people > exam.max_people {
            return Err(ReservationError::ExamCapacityExceeded { exam_id: exam.id });
        }

        let stored = self.env.exams.insert(&exam).await?;
        info!(exam_id = %stored.id, date = %stored.date, max_people = stored.max_people, "Exam created");
        metrics::record_exam_created();
        metrics::record_seats_remaining(&stored);
        Ok(stored)
    }

    /// Lists all exams.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    pub async fn list(&self) -> Result<Vec<Exam>> {
        self.env.exams.find_all().await
    }

    /// Returns one exam.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Exam does not exist → `ReservationError::ExamNotFound`
    /// - Storage fails → `ReservationError::Storage`
    pub async fn get(&self, id: ExamId) -> Result<Exam> {
        self.env
            .exams
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::ExamNotFound(id))
    }

    /// Lists exams created by a member.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    pub async fn list_by_owner(&self, owner_id: MemberId) -> Result<Vec<Exam>> {
        self.env.exams.find_by_owner(owner_id).await
    }

    /// Deletes an exam together with its reservations.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Actor is not an admin → `ReservationError::AdminRequired`
    /// - Exam does not exist → `ReservationError::ExamNotFound`
    /// - Storage fails → `ReservationError::Storage`
    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete(&self, actor: &Actor, id: ExamId) -> Result<()> {
        require_admin(actor)?;
        if !self.env.exams.delete(id).await? {
            return Err(ReservationError::ExamNotFound(id));
        }
        info!(exam_id = %id, "Exam deleted");
        Ok(())
    }

    /// Adds `delta` to an exam's occupancy. No bound is checked.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Exam does not exist → `ReservationError::ExamNotFound`
    /// - Occupancy would go below zero → `ReservationError::Internal`
    /// - Storage fails → `ReservationError::Storage`
    #[tracing::instrument(skip(self))]
    pub async fn apply_delta(&self, id: ExamId, delta: i64) -> Result<Exam> {
        let exam = self
            .env
            .exams
            .apply_delta(id, delta, self.env.clock.now())
            .await?;
        metrics::record_seats_remaining(&exam);
        Ok(exam)
    }
}
