//! Service errors mapped onto HTTP responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use services::{AccountError, CatalogError, ProgressError, StatsError};
use storage::repository::StorageError;

/// Error returned by every handler; rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Internal(detail) => {
                error!(%detail, "request failed");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound("Not found.".into()),
            StorageError::Conflict => Self::Validation("Conflicting record.".into()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CourseNotFound => Self::NotFound(err.to_string()),
            CatalogError::Content(inner) => Self::Validation(inner.to_string()),
            CatalogError::Storage(inner) => inner.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(_) | AccountError::UsernameTaken => {
                Self::Validation(err.to_string())
            }
            AccountError::InvalidCredentials | AccountError::InvalidToken => {
                Self::Unauthorized(err.to_string())
            }
            AccountError::Storage(inner) => inner.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::Validation(message) => Self::Validation(message),
            ProgressError::NotFound(_) => Self::NotFound(err.to_string()),
            ProgressError::Storage(inner) => inner.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::Storage(inner) => inner.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        Self::NotFound("Not found.".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let not_found: ApiError = ProgressError::NotFound("Quiz").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Quiz not found");

        let conflict: ApiError = StorageError::Conflict.into();
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let unauthorized: ApiError = AccountError::InvalidToken.into();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let internal: ApiError = StorageError::Connection("gone".into()).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
