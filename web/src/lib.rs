//! # Exam Reservation Web
//!
//! Axum HTTP surface over the core services.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, bearer tokens
//! │  - Request parsing and extractors       │  ← Correlation ids, tracing
//! │  - AppError → {"code", "message"}       │
//! ├─────────────────────────────────────────┤
//! │         Core services                   │
//! │  - Admission, lifecycle, ledger         │  ← Tested against in-memory stores
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use exam_reservation_testing::TestWorld;
//! use exam_reservation_web::{AppState, build_router};
//! use std::sync::Arc;
//!
//! let world = TestWorld::new();
//! let state = AppState::new(
//!     world.members.clone(),
//!     world.exams.clone(),
//!     world.reservations.clone(),
//!     Arc::new(world.store.clone()),
//! );
//! let app: axum::Router = build_router(state);
//! # let _ = app;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId, CurrentMember, LoginRequest, RequireAdmin};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use routes::build_router;
pub use state::AppState;
