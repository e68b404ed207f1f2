//! Error handling module
//!
//! A single application-level error type unifying domain failures and
//! infrastructure failures, with one `IntoResponse` impl so the HTTP
//! boundary never hand-rolls status-code logic per handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;

pub type AppResult<T> = Result<T, AppError>;

/// Application-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    EventStore(#[from] crate::event_store::EventStoreError),

    #[error("missing required header: {0}")]
    MissingHeader(String),

    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            AppError::Domain(DomainError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, "not_found", Some(id.clone()))
            }
            AppError::Domain(DomainError::InvariantViolation(msg)) => {
                (StatusCode::CONFLICT, "invariant_violation", Some(msg.clone()))
            }
            AppError::EventStore(crate::event_store::EventStoreError::ConcurrencyConflict {
                stream_id,
            }) => (StatusCode::CONFLICT, "concurrency_conflict", Some(stream_id.clone())),
            AppError::EventStore(crate::event_store::EventStoreError::InvalidTimestamp(ts)) => {
                (StatusCode::BAD_REQUEST, "invalid_timestamp", Some(ts.clone()))
            }
            AppError::EventStore(e @ crate::event_store::EventStoreError::Decode(_)) => {
                tracing::error!("corrupt stored event: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "decode_error", None)
            }
            AppError::EventStore(crate::event_store::EventStoreError::Database(e)) => {
                tracing::error!("database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::MissingHeader(header) => {
                (StatusCode::BAD_REQUEST, "missing_header", Some(header.clone()))
            }
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("configuration error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse { error: self.to_string(), error_code: error_code.to_string(), details };

        (status, Json(body)).into_response()
    }
}
