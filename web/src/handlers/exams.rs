//! Exam endpoints.
//!
//! Public reads under `/exams`, admin management under `/admin/exams`.

use crate::error::AppError;
use crate::extractors::RequireAdmin;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use exam_reservation_core::types::{Exam, ExamId, NewExam};

/// `GET /exams`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Exam>>, AppError> {
    Ok(Json(state.exams.list().await?))
}

/// `GET /exams/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ExamId>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(state.exams.get(id).await?))
}

/// `GET /admin/exams/:id`
pub async fn admin_get(
    state: State<AppState>,
    _admin: RequireAdmin,
    id: Path<ExamId>,
) -> Result<Json<Exam>, AppError> {
    get(state, id).await
}

/// `GET /admin/exams`: exams the calling admin created
pub async fn admin_list(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<Json<Vec<Exam>>, AppError> {
    Ok(Json(state.exams.list_by_owner(admin.0.id).await?))
}

/// `POST /admin/exams`
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<NewExam>,
) -> Result<(StatusCode, Json<Exam>), AppError> {
    let exam = state.exams.create(&admin.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

/// `DELETE /admin/exams/:id`
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<ExamId>,
) -> Result<StatusCode, AppError> {
    state.exams.delete(&admin.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
