//! Member endpoints.
//!
//! - `POST /members` - register
//! - `POST /members/login` - exchange credentials for a bearer token
//! - `GET /members/me` - current member
//! - `PUT /members` - update the current member
//! - `DELETE /members/:id` - delete self, or anyone as admin

use crate::error::AppError;
use crate::extractors::{CorrelationId, CurrentMember, LoginRequest};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use exam_reservation_core::environment::AccessToken;
use exam_reservation_core::types::{MemberId, MemberPatch, MemberView, NewMember};

/// `POST /members`
pub async fn register(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Json(input): Json<NewMember>,
) -> Result<(StatusCode, Json<MemberView>), AppError> {
    let member = state.members.register(input).await?;
    tracing::info!(
        correlation_id = %correlation_id.0,
        member_id = %member.id,
        "Member registered over HTTP"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

/// `POST /members/login`
pub async fn login(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    credentials: LoginRequest,
) -> Result<Json<AccessToken>, AppError> {
    let token = state
        .members
        .login(&credentials.username, &credentials.password)
        .await
        .inspect_err(|_| {
            tracing::info!(correlation_id = %correlation_id.0, "Login refused");
        })?;
    Ok(Json(token))
}

/// `GET /members/me`
#[allow(clippy::unused_async)]
pub async fn me(CurrentMember(member): CurrentMember) -> Json<MemberView> {
    Json(MemberView::from(member))
}

/// `PUT /members`
pub async fn update(
    State(state): State<AppState>,
    current: CurrentMember,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<MemberView>, AppError> {
    let member = state.members.update(&current.actor(), patch).await?;
    Ok(Json(member))
}

/// `DELETE /members/:id`
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentMember,
    Path(id): Path<MemberId>,
) -> Result<StatusCode, AppError> {
    state.members.delete(&current.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
