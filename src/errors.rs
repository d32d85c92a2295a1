use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::LedgerError;
use crate::workflow::WorkflowError;

/// Error body returned to HTTP clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient supply: {0}")]
    InsufficientSupply(String),

    #[error("Ledger drift: {0}")]
    LedgerDrift(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Locker unavailable: {0}")]
    LockerUnavailable(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Rejection reason is required")]
    MissingReason,

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(Uuid),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientSupply { .. } => {
                ServiceError::InsufficientSupply(err.to_string())
            }
            LedgerError::Drift(msg) => ServiceError::LedgerDrift(msg),
        }
    }
}

impl From<WorkflowError> for ServiceError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::MissingReason => ServiceError::MissingReason,
            other => ServiceError::InvalidTransition(other.to_string()),
        }
    }
}

impl From<sea_orm::TransactionError<ServiceError>> for ServiceError {
    fn from(err: sea_orm::TransactionError<ServiceError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            sea_orm::TransactionError::Transaction(service_err) => service_err,
        }
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidOperation(_)
            | Self::InvalidDateRange(_)
            | Self::InvalidTransition(_)
            | Self::MissingReason => StatusCode::BAD_REQUEST,
            Self::InsufficientSupply(_) | Self::LedgerDrift(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::LockerUnavailable(_)
            | Self::DuplicateName(_)
            | Self::ConcurrentModification(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for HTTP responses. Internal errors return generic
    /// messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether the caller may safely retry the whole operation unchanged.
    /// Only store-level conflicts qualify; invariant violations require
    /// corrected input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: self.response_message(),
            timestamp: Utc::now().to_rfc3339(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}
