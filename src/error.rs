//! Error types for the chat server
//!
//! `StoreError` covers failures of store operations and address decoding.
//! `AppError` wraps them together with transport, persistence and
//! configuration failures. Uses thiserror for ergonomic error definitions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::message::{ErrorBody, ErrorCode};

/// Store-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No user registered under the given key
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// No channel registered under the given key
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Address without a recognized sigil or key
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),
}

impl StoreError {
    /// True for the NotFound class of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UserNotFound(_) | StoreError::ChannelNotFound(_)
        )
    }
}

/// Application-level errors
///
/// Covers client errors (rejected requests) and internal errors
/// (reported to the operator, state untouched).
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation rejected
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request body or path could not be decoded
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (store actor stopped)
    #[error("Channel send error")]
    ChannelSend,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status and client-facing code for this error
    pub fn status(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Store(e) if e.is_not_found() => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Store(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidAddress),
            AppError::Malformed(_) => (StatusCode::BAD_REQUEST, ErrorCode::Malformed),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::from(StoreError::UserNotFound("ghost".into()));
        assert_eq!(err.status().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_client_errors_map_to_400() {
        let err = AppError::from(StoreError::InvalidAddress("+x".into()));
        assert_eq!(err.status().0, StatusCode::BAD_REQUEST);

        let err = AppError::Malformed("missing field `nickname`".into());
        assert_eq!(err.status().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        assert_eq!(
            AppError::ChannelSend.status().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
