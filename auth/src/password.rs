//! PBKDF2-SHA256 password hashing.
//!
//! Hashes are stored as `pbkdf2_sha256$<rounds>$<salt>$<digest>` with salt
//! and digest in unpadded standard base64. The round count travels with the
//! hash, so raising it only affects newly hashed passwords.

use crate::config::PasswordConfig;
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use exam_reservation_core::ReservationError;
use exam_reservation_core::environment;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2_sha256";
const DIGEST_LEN: usize = 32;

/// Password hasher backed by PBKDF2-HMAC-SHA256
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2Hasher {
    config: PasswordConfig,
}

impl Pbkdf2Hasher {
    /// Create a hasher.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRounds` if `config.rounds` is zero.
    pub const fn new(config: PasswordConfig) -> Result<Self> {
        if config.rounds == 0 {
            return Err(AuthError::InvalidRounds(config.rounds));
        }
        Ok(Self { config })
    }

    /// Hash a password with a fresh random salt.
    #[must_use]
    pub fn hash_password(&self, password: &str) -> String {
        let mut salt = vec![0u8; self.config.salt_len];
        rand::thread_rng().fill_bytes(&mut salt);
        encode(self.config.rounds, &salt, password)
    }

    /// Check a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedHash` if `stored` is not a hash this
    /// type produced.
    pub fn verify_password(&self, stored: &str, password: &str) -> Result<bool> {
        let parsed = Parsed::parse(stored)?;
        let digest = derive(parsed.rounds, &parsed.salt, password);
        Ok(constant_time_eq::constant_time_eq(&digest, &parsed.digest))
    }
}

// PBKDF2 runs on the blocking pool.
#[async_trait]
impl environment::PasswordHasher for Pbkdf2Hasher {
    async fn hash(&self, password: &str) -> exam_reservation_core::Result<String> {
        let hasher = *self;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| ReservationError::Internal(format!("Password hashing task failed: {e}")))
    }

    async fn verify(&self, hash: &str, password: &str) -> bool {
        let hasher = *self;
        let hash = hash.to_owned();
        let password = password.to_owned();
        match tokio::task::spawn_blocking(move || hasher.verify_password(&hash, &password)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Stored password hash could not be parsed");
                false
            }
            Err(err) => {
                tracing::error!(error = %err, "Password verification task failed");
                false
            }
        }
    }
}

fn derive(rounds: u32, salt: &[u8], password: &str) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut digest);
    digest
}

fn encode(rounds: u32, salt: &[u8], password: &str) -> String {
    let digest = derive(rounds, salt, password);
    format!(
        "{SCHEME}${rounds}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest)
    )
}

struct Parsed {
    rounds: u32,
    salt: Vec<u8>,
    digest: Vec<u8>,
}

impl Parsed {
    fn parse(stored: &str) -> Result<Self> {
        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(digest), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AuthError::MalformedHash);
        };

        let rounds = rounds
            .parse::<u32>()
            .ok()
            .filter(|r| *r > 0)
            .ok_or(AuthError::MalformedHash)?;
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| AuthError::MalformedHash)?;
        let digest = STANDARD_NO_PAD
            .decode(digest)
            .map_err(|_| AuthError::MalformedHash)?;
        if digest.len() != DIGEST_LEN {
            return Err(AuthError::MalformedHash);
        }
        Ok(Self {
            rounds,
            salt,
            digest,
        })
    }
}
