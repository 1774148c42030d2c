//! Error types for survey-web

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::session::SessionError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Survey cannot run (503) - e.g., too few images on disk
    #[error("{message}")]
    Unavailable {
        message: String,
        details: Vec<String>,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Session state error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// survey-common error
    #[error(transparent)]
    Common(#[from] survey_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use survey_common::Error as CommonError;

        let mut details = Vec::new();
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unavailable {
                message,
                details: extra,
            } => {
                details = extra;
                (StatusCode::SERVICE_UNAVAILABLE, "SURVEY_UNAVAILABLE", message)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Session(ref err) => {
                let (status, code) = match err {
                    SessionError::NotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
                    SessionError::InvalidIndex(_) => (StatusCode::NOT_FOUND, "TRIAL_NOT_FOUND"),
                    SessionError::InvalidConfidence(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_CONFIDENCE")
                    }
                    SessionError::AlreadyCompleted => (StatusCode::CONFLICT, "ALREADY_SUBMITTED"),
                    SessionError::NotOnLastPage => (StatusCode::CONFLICT, "NOT_ON_LAST_PAGE"),
                    SessionError::NotCompleted => (StatusCode::CONFLICT, "NOT_SUBMITTED"),
                };
                (status, code, err.to_string())
            }
            ApiError::Common(ref err) => {
                let (status, code) = match err {
                    CommonError::InsufficientData { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "INSUFFICIENT_DATA")
                    }
                    CommonError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    CommonError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                    CommonError::Database(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
                };
                (status, code, err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!("{} {}: {}", status.as_u16(), error_code, message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
