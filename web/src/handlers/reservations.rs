//! Reservation endpoints.
//!
//! Member routes act on the caller's own reservations (or any, for admins,
//! where the guard allows it); `/admin/reservations` routes require ADMIN.

use crate::error::AppError;
use crate::extractors::{CurrentMember, RequireAdmin};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use exam_reservation_core::types::{
    ExamId, MemberId, Reservation, ReservationHistoryEntry, ReservationId, ReservationPatch,
    ReservationStatus,
};
use serde::Deserialize;

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /reservations`
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    /// Exam to reserve seats for
    pub exam_id: ExamId,
    /// Seat count
    pub people: u32,
}

/// Body of `PUT /reservations` and `PUT /admin/reservations`
#[derive(Debug, Deserialize)]
pub struct UpdateReservationRequest {
    /// Exam the reservation belongs to
    pub exam_id: ExamId,
    /// Owner; defaults to the caller and is only honoured on the admin route
    pub member_id: Option<MemberId>,
    /// New seat count
    pub people: Option<u32>,
}

/// Body of `PUT /admin/reservations/status`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Reservation to transition
    pub reservation_id: ReservationId,
    /// Target status
    pub status: ReservationStatus,
}

// ============================================================================
// Member handlers
// ============================================================================

/// `POST /reservations`
pub async fn create(
    State(state): State<AppState>,
    current: CurrentMember,
    Json(input): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let reservation = state
        .reservations
        .create(&current.actor(), input.exam_id, input.people)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// `GET /reservations`
pub async fn list_mine(
    State(state): State<AppState>,
    current: CurrentMember,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.reservations.list_mine(&current.actor()).await?))
}

/// `GET /reservations/:id`
pub async fn get(
    State(state): State<AppState>,
    current: CurrentMember,
    Path(id): Path<ReservationId>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(state.reservations.get(&current.actor(), id).await?))
}

/// `GET /reservations/:id/history`
pub async fn history(
    State(state): State<AppState>,
    current: CurrentMember,
    Path(id): Path<ReservationId>,
) -> Result<Json<Vec<ReservationHistoryEntry>>, AppError> {
    Ok(Json(state.reservations.history(&current.actor(), id).await?))
}

/// `PUT /reservations`
pub async fn update(
    State(state): State<AppState>,
    current: CurrentMember,
    Json(input): Json<UpdateReservationRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .update(
            &current.actor(),
            input.exam_id,
            None,
            ReservationPatch { people: input.people },
        )
        .await?;
    Ok(Json(reservation))
}

/// `DELETE /reservations/:id`
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentMember,
    Path(id): Path<ReservationId>,
) -> Result<StatusCode, AppError> {
    state.reservations.delete(&current.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin handlers
// ============================================================================

/// `GET /admin/reservations/member/:member_id`
pub async fn list_for_member(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(member_id): Path<MemberId>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(
        state
            .reservations
            .list_for_member(&admin.actor(), member_id)
            .await?,
    ))
}

/// `PUT /admin/reservations`
pub async fn admin_update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<UpdateReservationRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .update(
            &admin.actor(),
            input.exam_id,
            input.member_id,
            ReservationPatch { people: input.people },
        )
        .await?;
    Ok(Json(reservation))
}

/// `PUT /admin/reservations/status`
pub async fn update_status(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<UpdateStatusRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .update_status(&admin.actor(), input.reservation_id, input.status)
        .await?;
    Ok(Json(reservation))
}

/// `DELETE /admin/reservations/:id`
pub async fn admin_delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ReservationId>,
) -> Result<StatusCode, AppError> {
    state.reservations.delete(&admin.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
