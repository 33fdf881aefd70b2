use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Machine-readable codes for precondition failures, so callers can resolve
/// the blocking condition and retry the same operation.
pub mod codes {
    pub const SAFETY_PHOTO_REQUIRED: &str = "SAFETY_PHOTO_REQUIRED";
    pub const UNRETURNED_PARTS: &str = "UNRETURNED_PARTS";
    pub const ISSUE_EXCEEDS_APPROVED: &str = "ISSUE_EXCEEDS_APPROVED";
    pub const RETURN_EXCEEDS_ISSUED: &str = "RETURN_EXCEEDS_ISSUED";
    pub const JOB_NOT_COMPLETED: &str = "JOB_NOT_COMPLETED";
}

/// Standardized JSON error body returned by all endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Machine-readable code for precondition failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
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

    /// Transition blocked by a business rule; the caller resolves the named
    /// condition and retries the same operation.
    #[error("{message}")]
    Precondition {
        code: &'static str,
        message: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid transition: cannot {action} a job in status {current}")]
    InvalidTransition { current: String, action: String },

    /// Digest mismatch on a cost snapshot. Never swallowed; always logged
    /// and surfaced to the caller.
    #[error("Integrity failure: {0}")]
    Integrity(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn precondition(code: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Precondition {
            code,
            message: message.into(),
        }
    }

    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Precondition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::Integrity(_) | Self::EventError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for HTTP responses. Internal errors return generic
    /// messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let Self::Integrity(ref msg) = self {
            tracing::error!(error = %msg, "integrity failure surfaced to caller");
        }

        let status = self.status_code();
        let code = match &self {
            Self::Precondition { code, .. } => Some((*code).to_string()),
            _ => None,
        };

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            code,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
