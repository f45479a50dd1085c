//! Custom Axum extractors.
//!
//! - `CorrelationId`: the id assigned by the correlation-id middleware
//! - `BearerToken`: the raw token from `Authorization: Bearer <token>`
//! - `CurrentMember`: the member the bearer token belongs to
//! - `RequireAdmin`: a `CurrentMember` with the ADMIN role
//! - `LoginRequest`: login credentials as a form or JSON body

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AppState;
use axum::{
    Form, Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
};
use exam_reservation_core::authorization::require_admin;
use exam_reservation_core::types::{Actor, Member};
use serde::Deserialize;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Read from the request extensions set by the middleware, falling back to
/// the `X-Correlation-ID` header or a fresh UUID when the layer is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }
        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        Ok(Self(correlation_id))
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }
        Ok(Self(token.to_string()))
    }
}

/// Authenticated member.
///
/// The token is verified and the member reloaded on every request, so a
/// deleted member's token stops working immediately.
#[derive(Debug, Clone)]
pub struct CurrentMember(pub Member);

impl CurrentMember {
    /// The caller as seen by the authorization guard
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.0.actor()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let member = state.members.authenticate(&token).await?;
        Ok(Self(member))
    }
}

/// Authenticated admin; other members get 403.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Member);

impl RequireAdmin {
    /// The caller as seen by the authorization guard
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.0.actor()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentMember(member) = CurrentMember::from_request_parts(parts, state).await?;
        if let Err(err) = require_admin(&member.actor()) {
            tracing::warn!(member_id = %member.id, "Admin route refused");
            return Err(err.into());
        }
        Ok(Self(member))
    }
}

/// Login credentials.
///
/// Accepted as `application/x-www-form-urlencoded` (the OAuth2 password
/// form) or as JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

#[async_trait]
impl<S> FromRequest<S> for LoginRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(login) = Form::<Self>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Ok(login)
        } else {
            let Json(login) = Json::<Self>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Ok(login)
        }
    }
}
