//! Reservation service scenarios over the in-memory store.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use exam_reservation_core::error::{AdmissionRule, ReservationError};
use exam_reservation_core::types::{ReservationPatch, ReservationStatus};
use exam_reservation_testing::{TestWorld, fixtures};

#[tokio::test]
async fn test_confirm_fill_and_release_scenario() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let other = world.seed_member(fixtures::user("other")).await;
    let exam = world
        .seed_exam(fixtures::exam(admin.id).in_days(10).current_people(10).max_people(50).build())
        .await;

    let reservation = world
        .reservations
        .create(&user.actor(), exam.id, 40)
        .await
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 10);

    let confirmed = world
        .reservations
        .update_status(&admin.actor(), reservation.id, ReservationStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 50);

    let err = world
        .reservations
        .create(&other.actor(), exam.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err, ReservationError::validation(AdmissionRule::Capacity));

    world
        .reservations
        .delete(&user.actor(), reservation.id)
        .await
        .unwrap();
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 10);
}

#[tokio::test]
async fn test_deadline_boundary() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).in_days(3).build()).await;

    world
        .reservations
        .create(&user.actor(), exam.id, 1)
        .await
        .unwrap();

    world.clock.advance(Duration::seconds(1));
    let err = world
        .reservations
        .create(&user.actor(), exam.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err, ReservationError::validation(AdmissionRule::Deadline));
}

#[tokio::test]
async fn test_capacity_boundary_on_create() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world
        .seed_exam(fixtures::exam(admin.id).current_people(7).max_people(10).build())
        .await;

    assert!(world.reservations.create(&user.actor(), exam.id, 3).await.is_ok());
    assert_eq!(
        world.reservations.create(&user.actor(), exam.id, 4).await,
        Err(ReservationError::validation(AdmissionRule::Capacity))
    );
}

#[tokio::test]
async fn test_create_for_missing_exam() {
    let world = TestWorld::new();
    let (_, user) = world.seed_admin_and_user().await;
    let exam_id = exam_reservation_core::types::ExamId::new();

    let err = world
        .reservations
        .create(&user.actor(), exam_id, 1)
        .await
        .unwrap_err();
    assert_eq!(err, ReservationError::ExamNotFound(exam_id));
}

#[tokio::test]
async fn test_owner_stranger_and_admin_access() {
    let world = TestWorld::new();
    let (admin, owner) = world.seed_admin_and_user().await;
    let stranger = world.seed_member(fixtures::user("stranger")).await;
    let exam = world.seed_exam(fixtures::exam(admin.id).build()).await;
    let reservation = world
        .reservations
        .create(&owner.actor(), exam.id, 2)
        .await
        .unwrap();

    assert!(world.reservations.get(&owner.actor(), reservation.id).await.is_ok());
    assert!(world.reservations.get(&admin.actor(), reservation.id).await.is_ok());
    assert_eq!(
        world.reservations.get(&stranger.actor(), reservation.id).await,
        Err(ReservationError::NotAllowed)
    );
    assert_eq!(
        world.reservations.delete(&stranger.actor(), reservation.id).await,
        Err(ReservationError::NotAllowed)
    );
    assert_eq!(
        world
            .reservations
            .update(
                &stranger.actor(),
                exam.id,
                Some(owner.id),
                ReservationPatch { people: Some(1) },
            )
            .await,
        Err(ReservationError::NotAllowed)
    );

    world
        .reservations
        .delete(&admin.actor(), reservation.id)
        .await
        .unwrap();
    assert_eq!(world.store.reservation_count(), 0);
}

#[tokio::test]
async fn test_status_change_requires_admin() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).build()).await;
    let reservation = world
        .reservations
        .create(&user.actor(), exam.id, 2)
        .await
        .unwrap();

    assert_eq!(
        world
            .reservations
            .update_status(&user.actor(), reservation.id, ReservationStatus::Confirmed)
            .await,
        Err(ReservationError::AdminRequired)
    );
    assert_eq!(
        world
            .reservations
            .list_for_member(&user.actor(), admin.id)
            .await,
        Err(ReservationError::AdminRequired)
    );
}

#[tokio::test]
async fn test_reconfirm_is_rejected_without_double_debit() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).max_people(20).build()).await;
    let reservation = world
        .reservations
        .create(&user.actor(), exam.id, 5)
        .await
        .unwrap();

    world
        .reservations
        .update_status(&admin.actor(), reservation.id, ReservationStatus::Confirmed)
        .await
        .unwrap();
    let err = world
        .reservations
        .update_status(&admin.actor(), reservation.id, ReservationStatus::Confirmed)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ReservationError::InvalidStatusTransition {
            from: ReservationStatus::Confirmed,
            to: ReservationStatus::Confirmed,
        }
    );
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 5);
}

#[tokio::test]
async fn test_confirm_fails_when_exam_filled_meanwhile() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let other = world.seed_member(fixtures::user("other")).await;
    let exam = world.seed_exam(fixtures::exam(admin.id).max_people(10).build()).await;

    let first = world.reservations.create(&user.actor(), exam.id, 6).await.unwrap();
    let second = world.reservations.create(&other.actor(), exam.id, 6).await.unwrap();

    world
        .reservations
        .update_status(&admin.actor(), first.id, ReservationStatus::Confirmed)
        .await
        .unwrap();
    let err = world
        .reservations
        .update_status(&admin.actor(), second.id, ReservationStatus::Confirmed)
        .await
        .unwrap_err();

    assert_eq!(err, ReservationError::ExamCapacityExceeded { exam_id: exam.id });
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 6);
    assert_eq!(
        world.store.reservation(second.id).unwrap().status,
        ReservationStatus::Pending
    );
}

#[tokio::test]
async fn test_deny_and_delete_leave_ledger() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).current_people(3).build()).await;
    let reservation = world.reservations.create(&user.actor(), exam.id, 4).await.unwrap();

    world
        .reservations
        .update_status(&admin.actor(), reservation.id, ReservationStatus::Denied)
        .await
        .unwrap();
    world
        .reservations
        .delete(&user.actor(), reservation.id)
        .await
        .unwrap();
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 3);
}

#[tokio::test]
async fn test_resizing_confirmed_reservation_moves_ledger() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).max_people(10).build()).await;
    let reservation = world.reservations.create(&user.actor(), exam.id, 4).await.unwrap();
    world
        .reservations
        .update_status(&admin.actor(), reservation.id, ReservationStatus::Confirmed)
        .await
        .unwrap();

    let grown = world
        .reservations
        .update(&user.actor(), exam.id, None, ReservationPatch { people: Some(7) })
        .await
        .unwrap();
    assert_eq!(grown.people, 7);
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 7);

    assert_eq!(
        world
            .reservations
            .update(&user.actor(), exam.id, None, ReservationPatch { people: Some(11) })
            .await,
        Err(ReservationError::ExamCapacityExceeded { exam_id: exam.id })
    );

    world
        .reservations
        .update(&admin.actor(), exam.id, Some(user.id), ReservationPatch { people: Some(2) })
        .await
        .unwrap();
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 2);
}

#[tokio::test]
async fn test_resizing_pending_reservation_is_free() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).max_people(10).build()).await;
    world.reservations.create(&user.actor(), exam.id, 4).await.unwrap();

    let updated = world
        .reservations
        .update(&user.actor(), exam.id, None, ReservationPatch { people: Some(9) })
        .await
        .unwrap();
    assert_eq!(updated.people, 9);
    assert_eq!(world.store.exam(exam.id).unwrap().current_people, 0);
}

#[tokio::test]
async fn test_missing_reservation_is_reported() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).build()).await;
    let id = exam_reservation_core::types::ReservationId::new();

    assert_eq!(
        world.reservations.delete(&admin.actor(), id).await,
        Err(ReservationError::reservation_not_found(id))
    );
    let err = world
        .reservations
        .update(&user.actor(), exam.id, None, ReservationPatch { people: Some(1) })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RESERVATION_NOT_FOUND");
}

#[tokio::test]
async fn test_listing_and_history() {
    let world = TestWorld::new();
    let (admin, user) = world.seed_admin_and_user().await;
    let exam = world.seed_exam(fixtures::exam(admin.id).build()).await;
    let r1 = world.reservations.create(&user.actor(), exam.id, 1).await.unwrap();
    let r2 = world.reservations.create(&user.actor(), exam.id, 2).await.unwrap();

    let mine = world.reservations.list_mine(&user.actor()).await.unwrap();
    assert_eq!(mine.iter().map(|r| r.id).collect::<Vec<_>>(), vec![r2.id, r1.id]);
    assert_eq!(
        world
            .reservations
            .list_for_member(&admin.actor(), user.id)
            .await
            .unwrap()
            .len(),
        2
    );

    world
        .reservations
        .update_status(&admin.actor(), r1.id, ReservationStatus::Confirmed)
        .await
        .unwrap();
    let history = world.reservations.history(&user.actor(), r1.id).await.unwrap();
    let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
    assert_eq!(statuses, vec![ReservationStatus::Pending, ReservationStatus::Confirmed]);
}
