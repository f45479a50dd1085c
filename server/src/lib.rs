//! # Exam Reservation Server
//!
//! Configuration and bootstrap for the `exam-reservation` binary: connects
//! the Postgres store, builds the services and returns the Axum router.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]

pub mod bootstrap;
pub mod config;

pub use config::Config;
