use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use super::ApiResponse;
use crate::models::code::PromotionalCode;
use crate::services::{AuthError, CodeError, QrError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    Unauthorized(String),

    NotFound(String),

    /// Business rejection that still carries the record it concerns.
    Rejected {
        message: String,
        data: Option<Box<PromotionalCode>>,
    },

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Rejected { message, .. } => write!(f, "Rejected: {message}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Box<PromotionalCode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Raw causes are only exposed to clients of debug builds.
fn debug_detail(msg: &str) -> Option<String> {
    cfg!(debug_assertions).then(|| msg.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, body) = match self {
            Self::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                ErrorBody {
                    data: None,
                    error: None,
                },
            ),
            Self::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                ErrorBody {
                    data: None,
                    error: None,
                },
            ),
            Self::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                msg,
                ErrorBody {
                    data: None,
                    error: None,
                },
            ),
            Self::Rejected { message, data } => (
                StatusCode::BAD_REQUEST,
                message,
                ErrorBody { data, error: None },
            ),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    ErrorBody {
                        data: None,
                        error: debug_detail(&msg),
                    },
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    ErrorBody {
                        data: None,
                        error: debug_detail(&msg),
                    },
                )
            }
        };

        (status, Json(ApiResponse::failure(message, body))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<CodeError> for ApiError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::Empty | CodeError::InvalidFormat | CodeError::PageOutOfRange => {
                Self::validation(err.to_string())
            }
            CodeError::NotFound => Self::Rejected {
                message: err.to_string(),
                data: None,
            },
            CodeError::AlreadyUsed(ref record) => Self::Rejected {
                message: err.to_string(),
                data: Some(record.clone()),
            },
            CodeError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::UserNotFound => Self::Unauthorized("Please log in to continue".to_string()),
            AuthError::WrongOldPassword => Self::validation(err.to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<QrError> for ApiError {
    fn from(err: QrError) -> Self {
        match err {
            QrError::Empty | QrError::TooLong => Self::validation(err.to_string()),
            QrError::Encode(_) | QrError::Image(_) => Self::internal(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Please log in to continue".to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_code_errors_map_to_statuses() {
        let (status, body) = render(CodeError::InvalidFormat.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = render(CodeError::NotFound.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Promotional code does not exist");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_database_error_is_genericised() {
        let (status, body) = render(ApiError::DatabaseError("disk I/O error".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "A database error occurred");
        if cfg!(debug_assertions) {
            assert_eq!(body["error"], "disk I/O error");
        } else {
            assert!(body.get("error").is_none());
        }
    }

    #[tokio::test]
    async fn test_auth_errors() {
        let (status, _) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = render(AuthError::WrongOldPassword.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Current password is incorrect");
    }

    #[tokio::test]
    async fn test_page_out_of_range_is_validation() {
        let (status, body) = render(CodeError::PageOutOfRange.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Page number is too large");
    }
}
