//! # Web API Error Types
//!
//! Errors returned by the trigger and snapshot endpoints, and their HTTP
//! mappings. The status callback endpoint never returns one of these.

use crate::error::DialerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Resource not found")]
    NotFound,

    #[error("{message}")]
    UnprocessableEntity { message: String },

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Database operation failed: {operation}")]
    DatabaseError { operation: String },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity {
            message: message.into(),
        }
    }

    pub fn database_error(operation: impl Into<String>) -> Self {
        Self::DatabaseError {
            operation: operation.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseError { .. } | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_code = match &self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::UnprocessableEntity { .. } => "UNPROCESSABLE_ENTITY",
            ApiError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ApiError::DatabaseError { .. } => "DATABASE_ERROR",
            ApiError::Internal => "INTERNAL_ERROR",
        };

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": self.to_string()
            }
        });

        (self.status_code(), Json(error_response)).into_response()
    }
}

impl From<DialerError> for ApiError {
    fn from(err: DialerError) -> Self {
        match err {
            DialerError::MalformedInput(message) => ApiError::unprocessable(message),
            DialerError::ContactNotFound(_) => ApiError::NotFound,
            DialerError::Database(_) => ApiError::database_error("Database operation failed"),
            DialerError::Queue(_) => ApiError::ServiceUnavailable,
            _ => ApiError::Internal,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
