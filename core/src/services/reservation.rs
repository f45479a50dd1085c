//! Reservation service: admission, lifecycle transitions and deletion.

use crate::admission::AdmissionValidator;
use crate::authorization::{authorize, require_admin};
use crate::environment::{Clock, ExamRepository, ReservationRepository};
use crate::error::{ReservationError, Result};
use crate::lifecycle::{LifecycleContext, Reducer, ReservationAction, ReservationReducer, release};
use crate::metrics;
use crate::types::{
    Actor, Exam, ExamId, MemberId, Reservation, ReservationHistoryEntry, ReservationId,
    ReservationPatch, ReservationStatus,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Dependencies of the reservation service
#[derive(Clone)]
pub struct ReservationEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Exam store, read for admission and lifecycle snapshots
    pub exams: Arc<dyn ExamRepository>,
    /// Reservation store
    pub reservations: Arc<dyn ReservationRepository>,
    /// Admission rules
    pub validator: AdmissionValidator,
}

impl ReservationEnvironment {
    /// Creates an environment with the default admission rules
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        exams: Arc<dyn ExamRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self {
            clock,
            exams,
            reservations,
            validator: AdmissionValidator::new(),
        }
    }

    /// Replaces the admission rules
    #[must_use]
    pub const fn with_validator(mut self, validator: AdmissionValidator) -> Self {
        self.validator = validator;
        self
    }
}

/// Reservation operations
#[derive(Clone)]
pub struct ReservationService {
    env: ReservationEnvironment,
    reducer: ReservationReducer,
}

impl ReservationService {
    /// Creates a new service
    #[must_use]
    pub const fn new(env: ReservationEnvironment) -> Self {
        Self {
            env,
            reducer: ReservationReducer::new(),
        }
    }

    /// Requests `people` seats at an exam on behalf of `actor`.
    ///
    /// The reservation is stored PENDING; no seats are consumed until an
    /// admin confirms it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Exam does not exist → `ReservationError::ExamNotFound`
    /// - An admission rule fails → `ReservationError::ReservationValidation`
    /// - Storage fails → `ReservationError::Storage`
    #[tracing::instrument(skip(self), fields(member_id = %actor.id))]
    pub async fn create(&self, actor: &Actor, exam_id: ExamId, people: u32) -> Result<Reservation> {
        let exam = self.load_exam(exam_id).await?;
        let now = self.env.clock.now();

        if let Err(err) = self.env.validator.validate(&exam, people, now) {
            warn!(%exam_id, people, error = %err, "Reservation request rejected");
            metrics::record_reservation("rejected");
            return Err(err);
        }

        let reservation = Reservation::pending(actor.id, exam_id, people, now);
        let stored = self.env.reservations.insert(&reservation).await?;

        info!(reservation_id = %stored.id, %exam_id, people, "Reservation created");
        metrics::record_reservation("created");
        Ok(stored)
    }

    /// Returns a reservation the actor may see.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Reservation does not exist → `ReservationError::ReservationNotFound`
    /// - Actor is neither owner nor admin → `ReservationError::NotAllowed`
    #[tracing::instrument(skip(self), fields(member_id = %actor.id))]
    pub async fn get(&self, actor: &Actor, id: ReservationId) -> Result<Reservation> {
        let reservation = self.load(id).await?;
        authorize(actor, &reservation)?;
        Ok(reservation)
    }

    /// Lists the actor's own reservations.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if the query fails.
    #[tracing::instrument(skip(self), fields(member_id = %actor.id))]
    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Reservation>> {
        self.env.reservations.find_by_member_id(actor.id).await
    }

    /// Lists another member's reservations.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Actor is not an admin → `ReservationError::AdminRequired`
    /// - Storage fails → `ReservationError::Storage`
    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn list_for_member(
        &self,
        actor: &Actor,
        member_id: MemberId,
    ) -> Result<Vec<Reservation>> {
        require_admin(actor)?;
        self.env.reservations.find_by_member_id(member_id).await
    }

    /// Applies a patch to the reservation `member_id` (default: the actor)
    /// holds for `exam_id`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No such reservation → `ReservationError::ReservationNotFound`
    /// - Actor is neither owner nor admin → `ReservationError::NotAllowed`
    /// - Seat count is zero → `ReservationError::ReservationValidation`
    /// - A CONFIRMED reservation grows past capacity → `ReservationError::ExamCapacityExceeded`
    /// - The reservation changed meanwhile → `ReservationError::ConcurrentModification`
    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn update(
        &self,
        actor: &Actor,
        exam_id: ExamId,
        member_id: Option<MemberId>,
        patch: ReservationPatch,
    ) -> Result<Reservation> {
        let member_id = member_id.unwrap_or(actor.id);
        let reservation = self
            .env
            .reservations
            .find_by_exam_and_member(exam_id, member_id)
            .await?
            .ok_or_else(|| ReservationError::ReservationNotFound {
                detail: format!("exam_id={exam_id}, member_id={member_id}"),
            })?;
        authorize(actor, &reservation)?;

        if patch.is_empty() {
            return Ok(reservation);
        }

        let updated = self
            .run(reservation, ReservationAction::ApplyPatch(patch))
            .await?;
        metrics::record_reservation("updated");
        Ok(updated)
    }

    /// Moves a reservation to CONFIRMED or DENIED.
    ///
    /// Confirming debits the exam ledger by the reservation's seat count in
    /// the same commit.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Actor is not an admin → `ReservationError::AdminRequired`
    /// - Reservation does not exist → `ReservationError::ReservationNotFound`
    /// - Transition is not allowed → `ReservationError::InvalidStatusTransition`
    /// - No room left at confirmation → `ReservationError::ExamCapacityExceeded`
    /// - The reservation changed meanwhile → `ReservationError::ConcurrentModification`
    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Reservation> {
        require_admin(actor)?;
        let reservation = self.load(id).await?;
        let updated = self
            .run(reservation, ReservationAction::Transition { to: status })
            .await?;

        info!(reservation_id = %id, %status, "Reservation status changed");
        metrics::record_transition(status);
        Ok(updated)
    }

    /// Deletes a reservation, crediting the ledger if it was CONFIRMED.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Reservation does not exist → `ReservationError::ReservationNotFound`
    /// - Actor is neither owner nor admin → `ReservationError::NotAllowed`
    /// - The reservation changed meanwhile → `ReservationError::ConcurrentModification`
    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete(&self, actor: &Actor, id: ReservationId) -> Result<()> {
        let reservation = self.load(id).await?;
        authorize(actor, &reservation)?;

        let effects = release(&reservation);
        self.env
            .reservations
            .delete(&reservation, &effects, self.env.clock.now())
            .await?;

        info!(reservation_id = %id, status = %reservation.status, "Reservation deleted");
        metrics::record_reservation("deleted");
        metrics::record_ledger_effects(&effects);
        Ok(())
    }

    /// Returns the history of a reservation the actor may see.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Reservation does not exist → `ReservationError::ReservationNotFound`
    /// - Actor is neither owner nor admin → `ReservationError::NotAllowed`
    pub async fn history(
        &self,
        actor: &Actor,
        id: ReservationId,
    ) -> Result<Vec<ReservationHistoryEntry>> {
        let reservation = self.get(actor, id).await?;
        self.env.reservations.history(reservation.id).await
    }

    async fn run(&self, mut reservation: Reservation, action: ReservationAction) -> Result<Reservation> {
        let expected = reservation.version();
        let reservation_id = reservation.id;
        let exam = self.load_exam(reservation.exam_id).await?;
        let ctx = LifecycleContext::new(exam, self.env.clock.now());

        let effects = self
            .reducer
            .reduce(&mut reservation, action, &ctx)
            .inspect_err(|err| {
                warn!(%reservation_id, ?action, error = %err, "Lifecycle action rejected");
            })?;

        let committed = self
            .env
            .reservations
            .commit(&reservation, expected, &effects)
            .await?;
        metrics::record_ledger_effects(&effects);
        Ok(committed)
    }

    async fn load(&self, id: ReservationId) -> Result<Reservation> {
        self.env
            .reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| ReservationError::reservation_not_found(id))
    }

    async fn load_exam(&self, id: ExamId) -> Result<Exam> {
        self.env
            .exams
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::ExamNotFound(id))
    }
}
