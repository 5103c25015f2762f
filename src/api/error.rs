//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::backend::BackendError;
use crate::content::Notice;
use crate::dashboard::DashboardError;
use crate::db::DatabaseError;
use crate::records::{RecordError, ValidationError};
use crate::report::ReportError;
use crate::roster::RosterError;
use crate::storage::StorageError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Access denied")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Patient limit reached ({limit})")]
    LimitReached { limit: u32 },
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    /// Backend write failure; the message is passed through as-is.
    #[error("Insert failed: {0}")]
    Insert(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "You don't have permission to access this resource".to_string(),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                detail.clone(),
            ),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail.clone()),
            ApiError::LimitReached { limit } => (
                StatusCode::FORBIDDEN,
                "LIMIT_REACHED",
                format!("Patient limit of {limit} reached for the current plan"),
            ),
            ApiError::UnsupportedMedia(detail) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA",
                detail.clone(),
            ),
            ApiError::PayloadTooLarge(detail) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                detail.clone(),
            ),
            ApiError::Insert(detail) => {
                tracing::warn!(detail, "Insert failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INSERT_FAILED", detail.clone())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }

    /// Attach the user-facing notice for this failure.
    pub fn with_notice(self, notice: Notice) -> NoticedError {
        NoticedError {
            error: self,
            notice: Some(notice),
        }
    }
}

fn respond(error: &ApiError, notice: Option<Notice>) -> Response {
    let (status, code, message) = error.parts();
    let body = ErrorBody {
        error: ErrorDetail { code, message },
        notice,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        respond(&self, None)
    }
}

/// An [`ApiError`] carrying the notice to show the user.
#[derive(Debug)]
pub struct NoticedError {
    pub error: ApiError,
    pub notice: Option<Notice>,
}

impl From<ApiError> for NoticedError {
    fn from(error: ApiError) -> Self {
        Self { error, notice: None }
    }
}

impl IntoResponse for NoticedError {
    fn into_response(self) -> Response {
        respond(&self.error, self.notice)
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedType(t) => ApiError::UnsupportedMedia(t),
            e @ StorageError::TooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
            StorageError::InvalidKey(k) => ApiError::BadRequest(format!("Invalid file key: {k}")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Validation(e) => e.into(),
            RecordError::ProfileNotFound(_) => ApiError::NotFound("Profile not found".into()),
            RecordError::Upload(e) => e.into(),
            RecordError::Insert(message) => ApiError::Insert(message),
            RecordError::Backend(e) => e.into(),
        }
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        match err {
            e @ (RosterError::Missing(_) | RosterError::InvalidDate(_)) => ApiError::Validation(e.to_string()),
            RosterError::ProfileNotFound => ApiError::NotFound("Profile not found".into()),
            RosterError::WrongProfileType(_) => ApiError::Forbidden,
            RosterError::LimitReached { limit } => ApiError::LimitReached { limit },
            RosterError::Insert(message) => ApiError::Insert(message),
            RosterError::InvalidAccessLink => ApiError::NotFound("Access link not found".into()),
            e @ RosterError::AlreadyClaimed => ApiError::Conflict(e.to_string()),
            e @ RosterError::QrCode(_) => ApiError::Internal(e.to_string()),
            RosterError::Backend(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            e @ (AuthError::InvalidEmail | AuthError::WeakPassword { .. } | AuthError::MissingName) => {
                ApiError::Validation(e.to_string())
            }
            e @ AuthError::EmailTaken => ApiError::Conflict(e.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidSession => ApiError::Unauthorized,
            AuthError::Database(e) => e.into(),
            AuthError::Backend(e) => e.into(),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::ProfileNotFound(_) => ApiError::NotFound("Profile not found".into()),
            DashboardError::Backend(e) => e.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            e @ (ReportError::Image(_) | ReportError::EmptyImage) => ApiError::BadRequest(e.to_string()),
            ReportError::Pdf(detail) => ApiError::Internal(detail),
        }
    }
}
