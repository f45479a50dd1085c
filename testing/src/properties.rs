//! Property-based testing utilities using proptest.
//!
//! Strategies generate sequences of reservation operations against a single
//! exam. Indices are resolved modulo the number of live reservations at the
//! time the operation runs, so every generated sequence is meaningful.

use proptest::prelude::*;

/// One step of a generated scenario
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// A member requests seats
    Request {
        /// Which of the scenario's members asks
        member: usize,
        /// Seat count, may be zero
        people: u32,
    },
    /// Admin confirms a reservation
    Confirm(usize),
    /// Admin denies a reservation
    Deny(usize),
    /// Owner changes the seat count
    Resize {
        /// Which reservation
        index: usize,
        /// New seat count, may be zero
        people: u32,
    },
    /// Owner deletes a reservation
    Delete(usize),
}

/// A single operation with seat counts up to `max_people`
pub fn operation(members: usize, max_people: u32) -> impl Strategy<Value = Operation> {
    let members = members.max(1);
    prop_oneof![
        3 => (0..members, 0..=max_people)
            .prop_map(|(member, people)| Operation::Request { member, people }),
        3 => any::<usize>().prop_map(Operation::Confirm),
        1 => any::<usize>().prop_map(Operation::Deny),
        2 => (any::<usize>(), 0..=max_people)
            .prop_map(|(index, people)| Operation::Resize { index, people }),
        2 => any::<usize>().prop_map(Operation::Delete),
    ]
}

/// A scenario of up to `len` operations
pub fn operations(
    members: usize,
    max_people: u32,
    len: usize,
) -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(operation(members, max_people), 0..=len)
}
