//! Custom error types for the user management service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the user management service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Unknown username or wrong password at login
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Missing, invalid or revoked bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but lacking the required role
    #[error("Forbidden")]
    Forbidden,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Uploaded payload could not be parsed
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// State that should be impossible was observed
    #[error("Unexpected state: {0}")]
    Unexpected(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Token signing or verification error
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Any other internal failure
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Database(DatabaseError::Conflict(_)) => {
                StatusCode::CONFLICT
            }
            ApiError::MalformedPayload(_)
            | ApiError::Unexpected(_)
            | ApiError::Database(_)
            | ApiError::Token(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::InvalidCredentials
            | ApiError::Unauthorized
            | ApiError::Forbidden
            | ApiError::BadRequest(_)
            | ApiError::NotFound(_)
            | ApiError::Conflict(_) => self.to_string(),
            ApiError::Database(DatabaseError::Conflict(_)) => "Conflict".to_string(),
            _ => {
                error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
