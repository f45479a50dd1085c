//! Authentication configuration.
//!
//! Values are provided by the application; the defaults match the
//! production settings.

use chrono::Duration;

/// Default PBKDF2-SHA256 iteration count
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 100_000;

/// Default access-token lifetime in minutes
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Password hashing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// PBKDF2 iteration count for new hashes.
    ///
    /// Default: 100 000
    pub rounds: u32,

    /// Salt length in bytes.
    ///
    /// Default: 16
    pub salt_len: usize,
}

impl PasswordConfig {
    /// Set the iteration count.
    #[must_use]
    pub const fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_PBKDF2_ROUNDS,
            salt_len: 16,
        }
    }
}

/// Access-token configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret used to sign tokens.
    pub secret: String,

    /// Token lifetime.
    ///
    /// Default: 30 minutes
    pub ttl: Duration,
}

impl TokenConfig {
    /// Create a token configuration with the default lifetime.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    /// Set the token lifetime in minutes.
    #[must_use]
    pub fn with_ttl_minutes(mut self, minutes: i64) -> Self {
        self.ttl = Duration::minutes(minutes);
        self
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}
