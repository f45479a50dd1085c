//! # Exam Reservation Testing
//!
//! Testing utilities for the exam reservation workspace.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`test_clock`])
//! - [`InMemoryStore`], one object implementing every repository trait
//! - Fake password hashing and token issuance
//! - Fixtures for members, exams and reservations
//! - [`LifecycleTest`], a Given-When-Then harness for the lifecycle reducer
//! - proptest strategies for lifecycle operations
//!
//! ## Example
//!
//! ```
//! use exam_reservation_testing::{TestWorld, fixtures};
//!
//! # tokio_test_block_on(async {
//! let world = TestWorld::new();
//! let admin = world.seed_member(fixtures::admin("root")).await;
//! let exam = world.seed_exam(fixtures::exam(admin.id).max_people(50).build()).await;
//! assert_eq!(exam.remaining(), 50);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![allow(clippy::module_name_repetitions)]

use chrono::{DateTime, Duration, Utc};
use exam_reservation_core::environment::Clock;
use std::sync::{Arc, RwLock};

pub mod fixtures;
pub mod lifecycle_test;
pub mod properties;
mod store;
mod world;

pub use lifecycle_test::LifecycleTest;
pub use store::InMemoryStore;
pub use world::TestWorld;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Arc, Clock, DateTime, Duration, RwLock, Utc};
    use async_trait::async_trait;
    use exam_reservation_core::environment::{
        AccessToken, PasswordHasher, TokenClaims, TokenIssuer,
    };
    use exam_reservation_core::error::{ReservationError, Result};
    use exam_reservation_core::types::{Member, MemberId, Role};

    /// Clock for deterministic tests
    ///
    /// Returns the same time until explicitly moved with [`FixedClock::advance`]
    /// or [`FixedClock::set`]. Clones share the same instant.
    ///
    /// # Example
    ///
    /// ```
    /// use exam_reservation_testing::mocks::FixedClock;
    /// use exam_reservation_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// assert_eq!(time1, clock.now());
    /// clock.advance(Duration::seconds(1));
    /// assert_eq!(clock.now() - time1, Duration::seconds(1));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            if let Ok(mut time) = self.time.write() {
                *time += by;
            }
        }

        /// Jump to an instant
        pub fn set(&self, to: DateTime<Utc>) {
            if let Ok(mut time) = self.time.write() {
                *time = to;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.read().map_or_else(|poisoned| **poisoned.get_ref(), |t| *t)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Hasher that stores passwords as `plain$<password>`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PlaintextHasher;

    #[async_trait]
    impl PasswordHasher for PlaintextHasher {
        async fn hash(&self, password: &str) -> Result<String> {
            Ok(format!("plain${password}"))
        }

        async fn verify(&self, hash: &str, password: &str) -> bool {
            hash.strip_prefix("plain$") == Some(password)
        }
    }

    /// Token issuer whose tokens are `token:<member_id>:<ROLE>:<username>`
    ///
    /// Tokens never expire unless issued with a TTL through
    /// [`StaticTokenIssuer::with_ttl`].
    #[derive(Debug, Clone, Copy)]
    pub struct StaticTokenIssuer {
        ttl: Duration,
    }

    impl Default for StaticTokenIssuer {
        fn default() -> Self {
            Self {
                ttl: Duration::days(365),
            }
        }
    }

    impl StaticTokenIssuer {
        /// Issuer with a custom token lifetime
        #[must_use]
        pub const fn with_ttl(ttl: Duration) -> Self {
            Self { ttl }
        }

        /// Token a member would receive, for tests that skip login
        #[must_use]
        pub fn token_for(member: &Member) -> String {
            format!("token:{}:{}:{}", member.id, member.role, member.username)
        }
    }

    impl TokenIssuer for StaticTokenIssuer {
        fn issue(&self, member: &Member, now: DateTime<Utc>) -> Result<AccessToken> {
            Ok(AccessToken {
                access_token: Self::token_for(member),
                token_type: "bearer",
                expires_at: now + self.ttl,
            })
        }

        fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims> {
            let mut parts = token.splitn(4, ':');
            let (Some("token"), Some(id), Some(role), Some(username)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(ReservationError::TokenValidation);
            };
            let member_id = id
                .parse::<uuid::Uuid>()
                .map(MemberId::from_uuid)
                .map_err(|_| ReservationError::TokenValidation)?;
            let role = role
                .parse::<Role>()
                .map_err(|_| ReservationError::TokenValidation)?;
            Ok(TokenClaims {
                member_id,
                username: username.to_string(),
                role,
                expires_at: now + self.ttl,
            })
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, PlaintextHasher, StaticTokenIssuer, test_clock};
