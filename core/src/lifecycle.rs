//! Reservation lifecycle reducer.
//!
//! ```text
//! PENDING ──Transition{Confirmed}──▶ CONFIRMED   emits Debit(people)
//!    │
//!    └─────Transition{Denied}─────▶ DENIED
//!
//! ApplyPatch on CONFIRMED          emits the signed people delta
//! Release on CONFIRMED             emits Credit(people)
//! ```
//!
//! The reducer is pure: it validates the action, mutates the reservation in
//! place and returns the ledger effects the storage layer must apply with it.
//! A rejected action leaves the reservation untouched.

use crate::error::{AdmissionRule, ReservationError, Result};
use crate::ledger::LedgerEffect;
use crate::types::{Exam, Reservation, ReservationPatch, ReservationStatus};
use chrono::{DateTime, Utc};
use smallvec::{SmallVec, smallvec};

/// Ledger effects produced by one reduction
pub type Effects = SmallVec<[LedgerEffect; 2]>;

/// The core reducer trait
///
/// Reducers are pure functions `(State, Action, Environment) → Result<Effects>`
/// that either reject the action or mutate state and describe the side
/// effects to run.
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// Read-only inputs the reduction depends on
    type Environment;

    /// Reduce an action into state changes and effects
    ///
    /// # Errors
    ///
    /// Returns an error, without touching `state`, when the action is not
    /// allowed in the current state.
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<Effects>;
}

/// Actions on a single reservation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservationAction {
    /// Move to a new status
    Transition {
        /// Target status
        to: ReservationStatus,
    },
    /// Apply a partial update
    ApplyPatch(ReservationPatch),
    /// The reservation is about to be deleted
    Release,
}

/// Snapshot the reducer decides against
#[derive(Clone, Debug)]
pub struct LifecycleContext {
    /// Exam the reservation belongs to, as last read
    pub exam: Exam,
    /// Current time
    pub now: DateTime<Utc>,
}

impl LifecycleContext {
    /// Creates a new context
    #[must_use]
    pub const fn new(exam: Exam, now: DateTime<Utc>) -> Self {
        Self { exam, now }
    }
}

/// Reducer for the reservation lifecycle
#[derive(Clone, Copy, Debug, Default)]
pub struct ReservationReducer;

impl ReservationReducer {
    /// Creates a new reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn transition(
        reservation: &mut Reservation,
        to: ReservationStatus,
        ctx: &LifecycleContext,
    ) -> Result<Effects> {
        let from = reservation.status;
        if from.is_terminal() || to == ReservationStatus::Pending {
            return Err(ReservationError::InvalidStatusTransition { from, to });
        }

        let effects: Effects = match to {
            ReservationStatus::Confirmed => {
                if !ctx.exam.has_room_for(reservation.people) {
                    return Err(ReservationError::ExamCapacityExceeded {
                        exam_id: ctx.exam.id,
                    });
                }
                smallvec![LedgerEffect::Debit {
                    exam_id: reservation.exam_id,
                    people: reservation.people,
                }]
            },
            ReservationStatus::Denied | ReservationStatus::Pending => SmallVec::new(),
        };

        reservation.status = to;
        reservation.modified_at = ctx.now;
        Ok(effects)
    }

    fn apply_patch(
        reservation: &mut Reservation,
        patch: ReservationPatch,
        ctx: &LifecycleContext,
    ) -> Result<Effects> {
        let Some(people) = patch.people else {
            return Ok(SmallVec::new());
        };
        if people == 0 {
            return Err(ReservationError::validation(AdmissionRule::People));
        }

        let mut effects = Effects::new();
        if reservation.status == ReservationStatus::Confirmed {
            let delta = i64::from(people) - i64::from(reservation.people);
            if let Some(effect) = LedgerEffect::from_delta(reservation.exam_id, delta) {
                if let LedgerEffect::Debit { people: extra, .. } = effect {
                    if !ctx.exam.has_room_for(extra) {
                        return Err(ReservationError::ExamCapacityExceeded {
                            exam_id: ctx.exam.id,
                        });
                    }
                }
                effects.push(effect);
            }
        }

        reservation.people = people;
        reservation.modified_at = ctx.now;
        Ok(effects)
    }
}

impl Reducer for ReservationReducer {
    type State = Reservation;
    type Action = ReservationAction;
    type Environment = LifecycleContext;

    fn reduce(
        &self,
        state: &mut Reservation,
        action: ReservationAction,
        env: &LifecycleContext,
    ) -> Result<Effects> {
        if state.exam_id != env.exam.id {
            return Err(ReservationError::Internal(format!(
                "reservation {} belongs to exam {}, context holds exam {}",
                state.id, state.exam_id, env.exam.id
            )));
        }

        match action {
            ReservationAction::Transition { to } => Self::transition(state, to, env),
            ReservationAction::ApplyPatch(patch) => Self::apply_patch(state, patch, env),
            ReservationAction::Release => Ok(release(state)),
        }
    }
}

/// Effects of deleting `reservation`: a credit when it was CONFIRMED
#[must_use]
pub fn release(reservation: &Reservation) -> Effects {
    match reservation.status {
        ReservationStatus::Confirmed => smallvec![LedgerEffect::Credit {
            exam_id: reservation.exam_id,
            people: reservation.people,
        }],
        ReservationStatus::Pending | ReservationStatus::Denied => SmallVec::new(),
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

    fn setup(current: u32, max: u32, people: u32) -> (Reservation, LifecycleContext) {
        let exam = Exam {
            id: ExamId::new(),
            owner_id: MemberId::new(),
            description: "Compilers".into(),
            date: now(),
            current_people: current,
            max_people: max,
            created_at: now(),
            modified_at: now(),
        };
        let reservation = Reservation::pending(MemberId::new(), exam.id, people, now());
        (reservation, LifecycleContext::new(exam, now()))
    }

    fn confirm() -> ReservationAction {
        ReservationAction::Transition { to: ReservationStatus::Confirmed }
    }

    #[test]
    fn test_confirm_debits_people() {
        let (mut r, ctx) = setup(10, 50, 40);
        let effects = ReservationReducer.reduce(&mut r, confirm(), &ctx).unwrap();
        assert_eq!(r.status, ReservationStatus::Confirmed);
        assert_eq!(
            effects.as_slice(),
            &[LedgerEffect::Debit { exam_id: r.exam_id, people: 40 }]
        );
    }

    #[test]
    fn test_deny_has_no_effect() {
        let (mut r, ctx) = setup(10, 50, 40);
        let effects = ReservationReducer
            .reduce(&mut r, ReservationAction::Transition { to: ReservationStatus::Denied }, &ctx)
            .unwrap();
        assert_eq!(r.status, ReservationStatus::Denied);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_reconfirm_is_rejected() {
        let (mut r, ctx) = setup(0, 50, 5);
        ReservationReducer.reduce(&mut r, confirm(), &ctx).unwrap();
        let before = r.clone();
        let err = ReservationReducer.reduce(&mut r, confirm(), &ctx).unwrap_err();
        assert_eq!(
            err,
            ReservationError::InvalidStatusTransition {
                from: ReservationStatus::Confirmed,
                to: ReservationStatus::Confirmed,
            }
        );
        assert_eq!(r, before);
    }

    #[test]
    fn test_confirm_without_room_leaves_state() {
        let (mut r, ctx) = setup(45, 50, 6);
        let before = r.clone();
        let err = ReservationReducer.reduce(&mut r, confirm(), &ctx).unwrap_err();
        assert_eq!(err, ReservationError::ExamCapacityExceeded { exam_id: ctx.exam.id });
        assert_eq!(r, before);
    }

    #[test]
    fn test_patch_on_confirmed_emits_delta() {
        let (mut r, mut ctx) = setup(0, 50, 5);
        ReservationReducer.reduce(&mut r, confirm(), &ctx).unwrap();
        ctx.exam.current_people = 5;

        let grow = ReservationAction::ApplyPatch(ReservationPatch { people: Some(8) });
        let effects = ReservationReducer.reduce(&mut r, grow, &ctx).unwrap();
        assert_eq!(effects[0].delta(), 3);

        let shrink = ReservationAction::ApplyPatch(ReservationPatch { people: Some(2) });
        let effects = ReservationReducer.reduce(&mut r, shrink, &ctx).unwrap();
        assert_eq!(effects[0].delta(), -6);
        assert_eq!(r.people, 2);
    }

    #[test]
    fn test_patch_on_pending_has_no_effect() {
        let (mut r, ctx) = setup(0, 50, 5);
        let effects = ReservationReducer
            .reduce(
                &mut r,
                ReservationAction::ApplyPatch(ReservationPatch { people: Some(9) }),
                &ctx,
            )
            .unwrap();
        assert!(effects.is_empty());
        assert_eq!(r.people, 9);
    }

    #[test]
    fn test_patch_to_zero_is_rejected() {
        let (mut r, ctx) = setup(0, 50, 5);
        let err = ReservationReducer
            .reduce(
                &mut r,
                ReservationAction::ApplyPatch(ReservationPatch { people: Some(0) }),
                &ctx,
            )
            .unwrap_err();
        assert_eq!(err, ReservationError::validation(AdmissionRule::People));
        assert_eq!(r.people, 5);
    }

    #[test]
    fn test_release_credits_only_confirmed() {
        let (mut r, ctx) = setup(0, 50, 7);
        assert!(release(&r).is_empty());
        ReservationReducer.reduce(&mut r, confirm(), &ctx).unwrap();
        assert_eq!(release(&r)[0].delta(), -7);
    }
}
