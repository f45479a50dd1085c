//! HS256 JSON Web Tokens.

use crate::config::TokenConfig;
use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use exam_reservation_core::environment::{AccessToken, TokenClaims, TokenIssuer};
use exam_reservation_core::types::{Member, MemberId, Role};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire form of the token payload
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    username: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256-signed access tokens.
///
/// Expiry is checked against the `now` passed in by the caller rather than
/// the system clock, so tests can drive it with a fixed clock.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtTokenIssuer {
    /// Create an issuer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingSecret` if the secret is empty.
    pub fn new(config: TokenConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        })
    }

    /// Encode a token for `member` valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn encode(&self, member: &Member, now: DateTime<Utc>) -> Result<AccessToken> {
        let expires_at = now + self.config.ttl;
        let claims = Claims {
            sub: *member.id.as_uuid(),
            username: member.username.clone(),
            role: member.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let access_token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))?;
        Ok(AccessToken {
            access_token,
            token_type: "bearer",
            expires_at,
        })
    }

    /// Decode and check a token at `now`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Signature or structure is invalid → `AuthError::TokenRejected`
    /// - `now` is at or past the expiry → `AuthError::TokenExpired`
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::TokenRejected(e.to_string()))?;
        let claims = data.claims;
        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::TokenRejected("exp out of range".into()))?;
        Ok(TokenClaims {
            member_id: MemberId::from_uuid(claims.sub),
            username: claims.username,
            role: claims.role,
            expires_at,
        })
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, member: &Member, now: DateTime<Utc>) -> exam_reservation_core::Result<AccessToken> {
        Ok(self.encode(member, now)?)
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> exam_reservation_core::Result<TokenClaims> {
        self.decode(token, now).map_err(|err| {
            tracing::debug!(error = %err, "Access token rejected");
            err.into()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use exam_reservation_core::ReservationError;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn member() -> Member {
        Member {
            id: MemberId::new(),
            username: "seo".into(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: now(),
            modified_at: now(),
        }
    }

    fn issuer(secret: &str) -> JwtTokenIssuer {
        JwtTokenIssuer::new(TokenConfig::new(secret)).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer("test-secret");
        let member = member();
        let token = issuer.issue(&member, now()).unwrap();
        assert_eq!(token.expires_at, now() + Duration::minutes(30));

        let claims = issuer.verify(&token.access_token, now()).unwrap();
        assert_eq!(claims.member_id, member.id);
        assert_eq!(claims.username, "seo");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_expiry_uses_given_time() {
        let issuer = issuer("test-secret");
        let token = issuer.encode(&member(), now()).unwrap();
        let later = now() + Duration::minutes(30);
        assert!(issuer
            .decode(&token.access_token, later - Duration::seconds(1))
            .is_ok());
        assert_eq!(
            issuer.decode(&token.access_token, later),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issuer("one").encode(&member(), now()).unwrap();
        assert_eq!(
            issuer("two").verify(&token.access_token, now()),
            Err(ReservationError::TokenValidation)
        );
        assert_eq!(
            issuer("one").verify("not.a.jwt", now()),
            Err(ReservationError::TokenValidation)
        );
    }

    #[test]
    fn test_empty_secret_is_refused() {
        assert!(matches!(
            JwtTokenIssuer::new(TokenConfig::new("")),
            Err(AuthError::MissingSecret)
        ));
    }
}
