//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side failures to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every error reaches the client as
//! `{ "error": "..." }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use woolery_core::wire::ErrorBody;

use crate::payments::ProcessorError;
use crate::pricing::PricingError;

/// Message returned for every 5xx response.
pub const GENERIC_ERROR: &str = "Internal Server Error";

/// Application-level error type for the backend.
#[derive(Debug, Error)]
pub enum AppError {
    /// The order could not be priced.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// The payment processor failed to create an intent.
    #[error("Payment processor error: {0}")]
    Processor(#[from] ProcessorError),

    /// The request body could not be decoded.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Pricing(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Pricing(_) | Self::Processor(_) | Self::MalformedRequest(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Pricing(err) if err.is_client_error() => err.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Pricing(_) | Self::Processor(_) | Self::MalformedRequest(_) | Self::Internal(_) => {
                GENERIC_ERROR.to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
