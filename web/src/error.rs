//! Error type for web handlers.
//!
//! [`AppError`] carries an HTTP status, a stable code and a user-facing
//! message, and renders as `{"code": ..., "message": ...}`. Domain errors
//! convert into it through `From<ReservationError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use exam_reservation_core::ReservationError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 for a request body that could not be read.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 401 for a missing or malformed bearer token.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "TOKEN_VALIDATION_FAILED", message)
    }

    /// 500 with a generic message.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }

    /// HTTP status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Boundary code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(status = %self.status, code = self.code, "Internal server error");
            }
        } else {
            tracing::debug!(status = %self.status, code = self.code, message = %self.message, "Request failed");
        }
        metrics::counter!("http_errors_total", "code" => self.code).increment(1);

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let status = match &err {
            ReservationError::ReservationValidation { .. }
            | ReservationError::ExamValidation { .. }
            | ReservationError::MemberValidation { .. }
            | ReservationError::ExamCapacityExceeded { .. }
            | ReservationError::UsernameTaken(_) => StatusCode::BAD_REQUEST,
            ReservationError::ReservationNotFound { .. }
            | ReservationError::ExamNotFound(_)
            | ReservationError::MemberNotFound(_) => StatusCode::NOT_FOUND,
            ReservationError::NotAllowed
            | ReservationError::InvalidCredentials
            | ReservationError::TokenValidation => StatusCode::UNAUTHORIZED,
            ReservationError::AdminRequired => StatusCode::FORBIDDEN,
            ReservationError::InvalidStatusTransition { .. }
            | ReservationError::ConcurrentModification(_) => StatusCode::CONFLICT,
            ReservationError::Storage(_) | ReservationError::Internal(_) => {
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.code(),
                    "An internal error occurred",
                )
                .with_source(anyhow::Error::new(err));
            },
        };
        Self::new(status, err.code(), err.to_string())
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal().with_source(err)
    }
}
