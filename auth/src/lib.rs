//! # Exam Reservation Auth
//!
//! Production implementations of the core's credential seams:
//!
//! - [`Pbkdf2Hasher`]: `PasswordHasher` backed by PBKDF2-HMAC-SHA256 with a
//!   random salt per password and constant-time comparison
//! - [`JwtTokenIssuer`]: `TokenIssuer` issuing HS256 JWTs carrying the
//!   member id, username and role
//!
//! ## Example
//!
//! ```
//! use exam_reservation_auth::{JwtTokenIssuer, Pbkdf2Hasher, PasswordConfig, TokenConfig};
//! use exam_reservation_core::environment::PasswordHasher;
//!
//! let hasher = Pbkdf2Hasher::new(PasswordConfig::default().with_rounds(1_000)).unwrap();
//! let hash = hasher.hash_password("s3cret");
//! assert!(hasher.verify_password(&hash, "s3cret").unwrap());
//!
//! let issuer = JwtTokenIssuer::new(TokenConfig::new("change-me").with_ttl_minutes(30)).unwrap();
//! # let _ = issuer;
//! ```

pub mod config;
pub mod error;
pub mod password;
pub mod token;

pub use config::{PasswordConfig, TokenConfig};
pub use error::{AuthError, Result};
pub use password::Pbkdf2Hasher;
pub use token::JwtTokenIssuer;
