//! Ergonomic testing utilities for reducers
//!
//! Given-When-Then builder for reducers returning `Result<Effects>`, with
//! [`LifecycleTest`] preconfigured for the reservation lifecycle.

use crate::mocks::test_clock;
use chrono::{DateTime, Utc};
use exam_reservation_core::environment::Clock;
use exam_reservation_core::error::ReservationError;
use exam_reservation_core::ledger::LedgerEffect;
use exam_reservation_core::lifecycle::{
    Effects, LifecycleContext, Reducer, ReservationAction, ReservationReducer,
};
use exam_reservation_core::types::{Exam, Reservation};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[LedgerEffect])>;

/// Type alias for error assertion functions
type ErrorAssertion = Box<dyn FnOnce(&ReservationError)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```
/// use exam_reservation_testing::{LifecycleTest, fixtures};
/// use exam_reservation_core::lifecycle::ReservationAction;
/// use exam_reservation_core::types::{MemberId, ReservationStatus};
///
/// let exam = fixtures::exam(MemberId::new()).current_people(10).max_people(50).build();
/// let reservation = fixtures::reservation(MemberId::new(), exam.id, 40);
///
/// LifecycleTest::lifecycle()
///     .given_exam(exam)
///     .given_state(reservation)
///     .when_action(ReservationAction::Transition { to: ReservationStatus::Confirmed })
///     .then_state(|r| assert_eq!(r.status, ReservationStatus::Confirmed))
///     .then_effects(|effects| assert_eq!(effects[0].delta(), 40))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
    error_assertions: Vec<ErrorAssertion>,
}

/// [`ReducerTest`] for the reservation lifecycle
pub type LifecycleTest =
    ReducerTest<ReservationReducer, Reservation, ReservationAction, LifecycleContext>;

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    ///
    /// On rejection the state is the unchanged initial state.
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[LedgerEffect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Expect the action to be rejected (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&ReservationError) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set, if the
    /// outcome (accepted or rejected) differs from what the assertions
    /// expect, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let outcome: Result<Effects, ReservationError> =
            self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        match outcome {
            Ok(effects) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected the action to be rejected, but it produced {effects:?}"
                );
                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            },
            Err(err) => {
                assert!(
                    !self.error_assertions.is_empty(),
                    "Expected the action to be accepted, but it failed: {err}"
                );
                for assertion in self.error_assertions {
                    assertion(&err);
                }
            },
        }
    }
}

impl LifecycleTest {
    /// Lifecycle test at the default test time
    #[must_use]
    pub const fn lifecycle() -> Self {
        Self::new(ReservationReducer::new())
    }

    /// Set the exam snapshot, at the default test time (Given)
    #[must_use]
    pub fn given_exam(self, exam: Exam) -> Self {
        self.given_exam_at(exam, test_clock().now())
    }

    /// Set the exam snapshot and the reduction time (Given)
    #[must_use]
    pub fn given_exam_at(self, exam: Exam, now: DateTime<Utc>) -> Self {
        self.with_env(LifecycleContext::new(exam, now))
    }
}

/// Helper assertions for ledger effects
pub mod assertions {
    use exam_reservation_core::ledger::LedgerEffect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[LedgerEffect]) {
        assert!(
            effects.is_empty(),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the net change to `current_people`
    ///
    /// # Panics
    ///
    /// Panics if the summed delta differs.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_net_delta(effects: &[LedgerEffect], expected: i64) {
        let net: i64 = effects.iter().map(LedgerEffect::delta).sum();
        assert_eq!(net, expected, "Expected net ledger delta {expected}, got {net}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use exam_reservation_core::error::AdmissionRule;
    use exam_reservation_core::types::{MemberId, ReservationPatch, ReservationStatus};

    #[test]
    fn test_deny_leaves_ledger() {
        let exam = fixtures::exam(MemberId::new()).build();
        LifecycleTest::lifecycle()
            .given_state(fixtures::reservation(MemberId::new(), exam.id, 3))
            .given_exam(exam)
            .when_action(ReservationAction::Transition { to: ReservationStatus::Denied })
            .then_state(|r| assert_eq!(r.status, ReservationStatus::Denied))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_rejected_patch_keeps_state() {
        let exam = fixtures::exam(MemberId::new()).build();
        LifecycleTest::lifecycle()
            .given_state(fixtures::reservation(MemberId::new(), exam.id, 3))
            .given_exam(exam)
            .when_action(ReservationAction::ApplyPatch(ReservationPatch { people: Some(0) }))
            .then_state(|r| assert_eq!(r.people, 3))
            .then_error(|err| {
                assert_eq!(*err, ReservationError::validation(AdmissionRule::People));
            })
            .run();
    }

    #[test]
    fn test_release_of_pending_is_free() {
        let exam = fixtures::exam(MemberId::new()).build();
        LifecycleTest::lifecycle()
            .given_state(fixtures::reservation(MemberId::new(), exam.id, 3))
            .given_exam(exam)
            .when_action(ReservationAction::Release)
            .then_effects(|effects| assertions::assert_net_delta(effects, 0))
            .run();
    }
}
