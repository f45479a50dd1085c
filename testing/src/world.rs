//! Services wired to one in-memory store and one fixed clock.

use crate::fixtures;
use crate::mocks::{FixedClock, PlaintextHasher, StaticTokenIssuer, test_clock};
use crate::store::InMemoryStore;
use exam_reservation_core::admission::AdmissionValidator;
use exam_reservation_core::environment::{
    Clock, ExamRepository, MemberRepository, PasswordHasher, ReservationRepository, TokenIssuer,
};
use exam_reservation_core::services::{
    ExamEnvironment, ExamService, MemberEnvironment, MemberService, ReservationEnvironment,
    ReservationService,
};
use exam_reservation_core::types::{Exam, Member, Reservation, ReservationStatus};
use std::sync::Arc;

/// Everything a service-level test needs
#[derive(Clone)]
pub struct TestWorld {
    /// Shared backing store
    pub store: InMemoryStore,
    /// Shared clock
    pub clock: FixedClock,
    /// Token issuer the member service uses
    pub tokens: StaticTokenIssuer,
    /// Member service
    pub members: MemberService,
    /// Exam service
    pub exams: ExamService,
    /// Reservation service
    pub reservations: ReservationService,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// World at the default test time with default admission rules
    #[must_use]
    pub fn new() -> Self {
        Self::with_validator(AdmissionValidator::new())
    }

    /// World with custom admission rules
    #[must_use]
    pub fn with_validator(validator: AdmissionValidator) -> Self {
        let store = InMemoryStore::new();
        let clock = test_clock();
        let tokens = StaticTokenIssuer::default();

        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let member_repo: Arc<dyn MemberRepository> = Arc::new(store.clone());
        let exam_repo: Arc<dyn ExamRepository> = Arc::new(store.clone());
        let reservation_repo: Arc<dyn ReservationRepository> = Arc::new(store.clone());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(PlaintextHasher);
        let issuer: Arc<dyn TokenIssuer> = Arc::new(tokens);

        let members = MemberService::new(MemberEnvironment::new(
            Arc::clone(&shared_clock),
            member_repo,
            hasher,
            issuer,
        ));
        let exams = ExamService::new(ExamEnvironment::new(
            Arc::clone(&shared_clock),
            Arc::clone(&exam_repo),
        ));
        let reservations = ReservationService::new(
            ReservationEnvironment::new(shared_clock, exam_repo, reservation_repo)
                .with_validator(validator),
        );

        Self {
            store,
            clock,
            tokens,
            members,
            exams,
            reservations,
        }
    }

    /// Store a member directly, bypassing registration
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    #[allow(clippy::expect_used)]
    pub async fn seed_member(&self, member: Member) -> Member {
        MemberRepository::insert(&self.store, &member)
            .await
            .expect("seeding a member should succeed")
    }

    /// Store an exam directly, bypassing validation
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    #[allow(clippy::expect_used)]
    pub async fn seed_exam(&self, exam: Exam) -> Exam {
        ExamRepository::insert(&self.store, &exam)
            .await
            .expect("seeding an exam should succeed")
    }

    /// Store a reservation directly with the given status.
    ///
    /// The ledger is not touched.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    #[allow(clippy::expect_used)]
    pub async fn seed_reservation(&self, mut reservation: Reservation, status: ReservationStatus) -> Reservation {
        reservation.status = status;
        ReservationRepository::insert(&self.store, &reservation)
            .await
            .expect("seeding a reservation should succeed")
    }

    /// Seed an admin and a user, returned in that order
    pub async fn seed_admin_and_user(&self) -> (Member, Member) {
        let admin = self.seed_member(fixtures::admin("admin")).await;
        let user = self.seed_member(fixtures::user("user")).await;
        (admin, user)
    }
}
