//! Error types for the lending server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric codes reported in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    StorageFailure = 3,
    NotFound = 4,
    NoCopiesAvailable = 5,
    Duplicate = 6,
    LimitReached = 7,
    NotBorrowable = 8,
    UserBlocked = 9,
    BadValue = 10,
    CorruptState = 11,
}

/// Why a loan request was refused.
///
/// Denials are ordinary outcomes of the lending policy, not faults: they are
/// returned to the caller and never logged above `warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    LibrarianCannotBorrow,
    UserBlocked,
    LimitReached,
    NoCopiesAvailable,
}

impl DenialReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenialReason::LibrarianCannotBorrow => "librarians do not borrow",
            DenialReason::UserBlocked => "user blocked due to overdue items",
            DenialReason::LimitReached => "limit reached",
            DenialReason::NoCopiesAvailable => "no copies available",
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            DenialReason::LibrarianCannotBorrow => ErrorCode::NotBorrowable,
            DenialReason::UserBlocked => ErrorCode::UserBlocked,
            DenialReason::LimitReached => ErrorCode::LimitReached,
            DenialReason::NoCopiesAvailable => ErrorCode::NoCopiesAvailable,
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Loan denied: {0}")]
    Denied(DenialReason),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Corrupt record {record} in {file}: {reason}")]
    CorruptState {
        file: String,
        record: usize,
        reason: String,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn corrupt(file: impl Into<String>, record: usize, reason: impl Into<String>) -> Self {
        AppError::CorruptState {
            file: file.into(),
            record,
            reason: reason.into(),
        }
    }

    /// The policy denial carried by this error, if any
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            AppError::Denied(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::Denied(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                reason.code(),
                reason.message().to_string(),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::Persistence(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageFailure,
                    "Storage error".to_string(),
                )
            }
            AppError::CorruptState { .. } => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::CorruptState,
                    "Corrupt stored data".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
