//! # Exam Reservation Core
//!
//! Domain core for an exam-reservation backend: members reserve seats at
//! admin-managed exams, subject to a deadline and a capacity rule, and an
//! admin approves or denies each request.
//!
//! ## Core Concepts
//!
//! - **Capacity ledger** ([`ledger`]): an exam's `current_people` against its
//!   `max_people`, moved only by [`ledger::LedgerEffect`]s
//! - **Admission validator** ([`admission`]): people, deadline and capacity
//!   rules checked when a reservation is requested
//! - **Lifecycle reducer** ([`lifecycle`]): PENDING → CONFIRMED | DENIED, as a
//!   pure function returning the ledger effects of each step
//! - **Authorization guard** ([`authorization`]): owner or admin
//! - **Environment** ([`environment`]): repositories, clock, hasher and token
//!   issuer injected as trait objects
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Explicit Effects (the reducer describes ledger changes, storage applies them)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```
//! use exam_reservation_core::lifecycle::{LifecycleContext, Reducer, ReservationAction, ReservationReducer};
//! use exam_reservation_core::types::{Exam, ExamId, MemberId, Reservation, ReservationStatus};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let exam = Exam {
//!     id: ExamId::new(),
//!     owner_id: MemberId::new(),
//!     description: "Databases final".into(),
//!     date: now,
//!     current_people: 10,
//!     max_people: 50,
//!     created_at: now,
//!     modified_at: now,
//! };
//! let mut reservation = Reservation::pending(MemberId::new(), exam.id, 40, now);
//!
//! let effects = ReservationReducer
//!     .reduce(
//!         &mut reservation,
//!         ReservationAction::Transition { to: ReservationStatus::Confirmed },
//!         &LifecycleContext::new(exam, now),
//!     )
//!     .unwrap();
//! assert_eq!(effects[0].delta(), 40);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod authorization;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod metrics;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{ReservationError, Result};
pub use smallvec::{SmallVec, smallvec};
