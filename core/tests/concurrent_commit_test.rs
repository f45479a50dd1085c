//! Two reductions taken from the same snapshot and committed one after the
//! other. The second must either be rejected or leave the ledger equal to
//! the seats its surviving reservation holds.

#![allow(clippy::unwrap_used)]

use exam_reservation_core::ReservationError;
use exam_reservation_core::environment::{Clock, ReservationRepository};
use exam_reservation_core::lifecycle::{
    Effects, LifecycleContext, Reducer, ReservationAction, ReservationReducer,
};
use exam_reservation_core::types::{
    ExamId, Reservation, ReservationId, ReservationPatch, ReservationStatus,
};
use exam_reservation_testing::{TestWorld, fixtures};
use proptest::prelude::*;

const BASE: u32 = 2;
const MAX: u32 = 20;

struct Race {
    world: TestWorld,
    exam_id: ExamId,
    reservation_id: ReservationId,
}

/// A reduced copy of the snapshot, not yet written
struct Reduced {
    reservation: Reservation,
    expected: Reservation,
    effects: Effects,
    release: bool,
}

impl Race {
    async fn new(status: ReservationStatus, people: u32) -> Self {
        let world = TestWorld::new();
        let admin = world.seed_member(fixtures::admin("admin")).await;
        let held = if status == ReservationStatus::Confirmed { people } else { 0 };
        let exam = world
            .seed_exam(
                fixtures::exam(admin.id)
                    .current_people(BASE + held)
                    .max_people(MAX)
                    .build(),
            )
            .await;
        let reservation = world
            .seed_reservation(fixtures::reservation(admin.id, exam.id, people), status)
            .await;
        Self {
            world,
            exam_id: exam.id,
            reservation_id: reservation.id,
        }
    }

    /// Reduce `action` against the current stored snapshot
    fn reduce(&self, action: ReservationAction) -> Option<Reduced> {
        let snapshot = self.world.store.reservation(self.reservation_id)?;
        let exam = self.world.store.exam(self.exam_id)?;
        let ctx = LifecycleContext::new(exam, self.world.clock.now());
        let mut reservation = snapshot.clone();
        let effects = ReservationReducer.reduce(&mut reservation, action, &ctx).ok()?;
        Some(Reduced {
            reservation,
            expected: snapshot,
            effects,
            release: action == ReservationAction::Release,
        })
    }

    async fn write(&self, pending: &Reduced) -> Result<(), ReservationError> {
        let store = &self.world.store;
        if pending.release {
            ReservationRepository::delete(
                store,
                &pending.expected,
                &pending.effects,
                self.world.clock.now(),
            )
            .await
        } else {
            store
                .commit(&pending.reservation, pending.expected.version(), &pending.effects)
                .await
                .map(|_| ())
        }
    }

    fn held_seats(&self) -> u32 {
        self.world
            .store
            .reservation(self.reservation_id)
            .filter(|r| r.status == ReservationStatus::Confirmed)
            .map_or(0, |r| r.people)
    }

    fn current_people(&self) -> u32 {
        self.world.store.exam(self.exam_id).unwrap().current_people
    }
}

fn resize(people: u32) -> ReservationAction {
    ReservationAction::ApplyPatch(ReservationPatch {
        people: Some(people),
    })
}

const CONFIRM: ReservationAction = ReservationAction::Transition {
    to: ReservationStatus::Confirmed,
};

#[tokio::test]
async fn test_resize_then_resize_from_same_snapshot() {
    let race = Race::new(ReservationStatus::Confirmed, 5).await;
    let grow = race.reduce(resize(9)).unwrap();
    let shrink = race.reduce(resize(2)).unwrap();

    race.write(&grow).await.unwrap();
    assert_eq!(
        race.write(&shrink).await,
        Err(ReservationError::ConcurrentModification(race.reservation_id))
    );

    assert_eq!(race.held_seats(), 9);
    assert_eq!(race.current_people(), BASE + 9);
}

#[tokio::test]
async fn test_resize_then_delete_from_same_snapshot() {
    let race = Race::new(ReservationStatus::Confirmed, 5).await;
    let grow = race.reduce(resize(8)).unwrap();
    let delete = race.reduce(ReservationAction::Release).unwrap();

    race.write(&grow).await.unwrap();
    assert_eq!(
        race.write(&delete).await,
        Err(ReservationError::ConcurrentModification(race.reservation_id))
    );

    assert_eq!(race.current_people(), BASE + 8);
}

#[tokio::test]
async fn test_delete_then_resize_from_same_snapshot() {
    let race = Race::new(ReservationStatus::Confirmed, 5).await;
    let delete = race.reduce(ReservationAction::Release).unwrap();
    let grow = race.reduce(resize(8)).unwrap();

    race.write(&delete).await.unwrap();
    assert!(race.write(&grow).await.is_err());

    assert_eq!(race.world.store.reservation(race.reservation_id), None);
    assert_eq!(race.current_people(), BASE);
}

#[tokio::test]
async fn test_confirm_twice_from_same_snapshot() {
    let race = Race::new(ReservationStatus::Pending, 6).await;
    let first = race.reduce(CONFIRM).unwrap();
    let second = race.reduce(CONFIRM).unwrap();

    race.write(&first).await.unwrap();
    assert_eq!(
        race.write(&second).await,
        Err(ReservationError::ConcurrentModification(race.reservation_id))
    );

    assert_eq!(race.current_people(), BASE + 6);
}

fn action() -> impl Strategy<Value = ReservationAction> {
    prop_oneof![
        (1..=MAX).prop_map(resize),
        Just(CONFIRM),
        Just(ReservationAction::Transition {
            to: ReservationStatus::Denied
        }),
        Just(ReservationAction::Release),
    ]
}

fn status() -> impl Strategy<Value = ReservationStatus> {
    prop_oneof![
        Just(ReservationStatus::Pending),
        Just(ReservationStatus::Confirmed),
        Just(ReservationStatus::Denied),
    ]
}

fn run(
    status: ReservationStatus,
    people: u32,
    first: ReservationAction,
    second: ReservationAction,
) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(async {
        let race = Race::new(status, people).await;
        let a = race.reduce(first);
        let b = race.reduce(second);

        let a_written = match &a {
            Some(a) => race.write(a).await.is_ok(),
            None => false,
        };
        if let Some(b) = &b {
            let result = race.write(b).await;
            let moved = a_written
                && a.as_ref().is_some_and(|a| {
                    a.release || a.reservation.version() != a.expected.version()
                });
            if moved {
                prop_assert!(result.is_err(), "stale write was accepted: {:?}", result);
            }
        }

        prop_assert!(race.current_people() <= MAX);
        prop_assert_eq!(race.current_people(), BASE + race.held_seats());
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn racing_reductions_keep_ledger_consistent(
        status in status(),
        people in 1u32..=(MAX - BASE),
        first in action(),
        second in action(),
    ) {
        run(status, people, first, second)?;
    }
}
