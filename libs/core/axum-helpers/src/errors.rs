//! Application error kinds and their envelope renderings.

use crate::envelope::{ApiError, ApiResponse, ResponseDetails};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

/// Error kinds a handler can surface.
///
/// Handlers recover nothing: every failure becomes one of these kinds and is
/// rendered as an error envelope with the matching status code. Broker and
/// stream failures never reach here; background emitters log and continue.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("datastore error: {0}")]
    Datastore(String),

    #[error("blob storage error: {0}")]
    BlobStore(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Datastore(_) | AppError::BlobStore(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code surfaced in `error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::InvalidInput(_) | AppError::Validation(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::Datastore(_) => "datastore_error",
            AppError::BlobStore(_) => "blob_storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to return to the client.
    ///
    /// Internal failure details go to the logs, not the wire.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "unauthenticated".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Validation(errors) => errors.to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Datastore(_) => "error talking to the datastore".to_string(),
            AppError::BlobStore(_) => "error talking to blob storage".to_string(),
            AppError::Internal(_) => "internal server error".to_string(),
        }
    }

    /// Attach response details so the failure can render a full envelope.
    pub fn with_details(self, details: &ResponseDetails) -> EnvelopeError {
        EnvelopeError {
            details: details.clone(),
            error: self,
        }
    }
}

/// An [`AppError`] paired with the request's response details.
///
/// Handlers propagate this with `?` so every error path still carries the
/// trace ID and household scope the middleware derived at request start.
#[derive(Debug)]
pub struct EnvelopeError {
    pub details: ResponseDetails,
    pub error: AppError,
}

impl IntoResponse for EnvelopeError {
    fn into_response(self) -> Response {
        let status = self.error.status();

        match &self.error {
            AppError::Datastore(details) | AppError::BlobStore(details) => {
                tracing::error!(trace_id = %self.details.trace_id, code = self.error.code(), "{details}");
            }
            AppError::Internal(details) => {
                tracing::error!(trace_id = %self.details.trace_id, "{details}");
            }
            other => {
                tracing::info!(trace_id = %self.details.trace_id, code = other.code(), "{other}");
            }
        }

        let body = ApiResponse::with_error(
            self.details,
            ApiError {
                code: self.error.code().to_string(),
                message: self.error.public_message(),
            },
        );

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_kind() {
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InvalidInput("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("row".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Datastore("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::Datastore("connection refused at 10.0.0.1".into());
        assert!(!err.public_message().contains("10.0.0.1"));
    }

    #[test]
    fn envelope_error_renders_error_block() {
        let details = ResponseDetails::new("cafe01".to_string());
        let response = AppError::NotFound("recipe prep task not found".into())
            .with_details(&details)
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
