/// Unified error types for Lockside
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum LockError {
    /// Requested validity window is malformed (end not after start)
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Display label for a code is unusable (empty after truncation)
    #[error("Invalid code name: {0}")]
    InvalidCodeName(String),

    /// PIN length outside the 4-8 digit range supported by the locks
    #[error("Invalid code length: {0} (must be 4-8 digits)")]
    InvalidCodeLength(usize),

    /// General request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lookup of a purchase or access code by unknown id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payment event whose status does not allow code creation
    #[error("Payment not confirmed: {0}")]
    PaymentNotConfirmed(String),

    /// Lock gateway unreachable or rejected the request.
    /// Soft at the engine boundary: attached to results, never aborts
    /// local record creation or deletion.
    #[error("Lock gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Persistence flush failed; the in-memory mutation still applies
    #[error("Storage degraded: {0}")]
    StorageDegraded(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert LockError to HTTP response
impl IntoResponse for LockError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            LockError::InvalidWindow(_)
            | LockError::InvalidCodeName(_)
            | LockError::InvalidCodeLength(_)
            | LockError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            LockError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            LockError::PaymentNotConfirmed(_) => (
                StatusCode::PAYMENT_REQUIRED,
                "PaymentNotConfirmed",
                self.to_string(),
            ),
            LockError::GatewayUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                "GatewayUnavailable",
                self.to_string(),
            ),
            LockError::StorageDegraded(_) | LockError::Io(_) | LockError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for Lockside operations
pub type LockResult<T> = Result<T, LockError>;
