//! HTTP request handlers, one module per resource.

pub mod exams;
pub mod health;
pub mod members;
pub mod reservations;

pub use health::{health_check, readiness_check};
