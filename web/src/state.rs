//! Application state for Axum handlers.

use exam_reservation_core::environment::StorageHealth;
use exam_reservation_core::services::{ExamService, MemberService, ReservationService};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// The services are cheap to clone: each holds only `Arc`-shared
/// collaborators.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and member management
    pub members: MemberService,
    /// Exam management
    pub exams: ExamService,
    /// Reservation lifecycle
    pub reservations: ReservationService,
    /// Storage health check for `/ready`
    pub storage: Arc<dyn StorageHealth>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        members: MemberService,
        exams: ExamService,
        reservations: ReservationService,
        storage: Arc<dyn StorageHealth>,
    ) -> Self {
        Self {
            members,
            exams,
            reservations,
            storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone_and_send() {
        fn assert_bounds<T: Clone + Send + Sync + 'static>() {}
        assert_bounds::<AppState>();
    }
}
