//! Shared error types for the services crate.

use thiserror::Error;

use academy_core::model::{ContentError, ScoreError, UserValidationError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("Course not found")]
    CourseNotFound,
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] UserValidationError),
    #[error("A user with that username already exists.")]
    UsernameTaken,
    #[error("No active account found with the given credentials")]
    InvalidCredentials,
    #[error("Given token not valid for any token type")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token encoding failed: {0}")]
    Encoding(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ScoreError> for ProgressError {
    fn from(err: ScoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
