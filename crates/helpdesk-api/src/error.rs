//! API error types and JSON error response formatting.
//!
//! ApiError gives every endpoint the same `{ error, message }` body and maps
//! domain errors onto HTTP status codes. Internal details are logged, never
//! returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use helpdesk_chat::ChatError;
use helpdesk_core::error::HelpdeskError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - malformed parameters.
    BadRequest(String),
    /// 401 Unauthorized - missing token or bad credentials.
    Unauthorized(String),
    /// 403 Forbidden - authenticated but not allowed.
    Forbidden(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 409 Conflict - state conflict (e.g., reopening a resolved issue).
    Conflict(String),
    /// 422 Unprocessable Entity - validation failure.
    UnprocessableEntity(String),
    /// 500 Internal Server Error - the message is logged, not returned.
    Internal(String),
    /// 503 Service Unavailable - the record store is offline.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<HelpdeskError> for ApiError {
    fn from(err: HelpdeskError) -> Self {
        match err {
            HelpdeskError::NotFound(msg) => ApiError::NotFound(format!("Not found: {}", msg)),
            HelpdeskError::Validation(msg) => ApiError::UnprocessableEntity(msg),
            HelpdeskError::Conflict(msg) | HelpdeskError::ReadOnly(msg) => ApiError::Conflict(msg),
            HelpdeskError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            HelpdeskError::Forbidden(msg) => ApiError::Forbidden(msg),
            HelpdeskError::Offline(msg) | HelpdeskError::Unavailable(msg) => {
                ApiError::ServiceUnavailable(format!("Server Offline: {}", msg))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            ChatError::EmptyMessage
            | ChatError::MessageTooLong(_)
            | ChatError::MissingFields(_)
            | ChatError::Validation(_) => ApiError::UnprocessableEntity(err.to_string()),
            ChatError::Offline(msg) => ApiError::ServiceUnavailable(format!("Server Offline: {}", msg)),
            ChatError::StorageError(msg) => ApiError::Internal(msg),
        }
    }
}
