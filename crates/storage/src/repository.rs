use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use academy_core::model::{
    ActivityScope, Course, CourseDraft, CourseId, CourseRow, GameAttempt, GameId, QuizAttempt,
    QuizId, Score, TopicId, Upserted, User, UserId, UserProgress, Username,
};

use crate::memory::InMemoryRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Stored account including its password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Account fields for insertion; the id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: Username,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// Read access to the course hierarchy plus bulk import.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All courses with nested content, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// One course with nested content, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Course headers only, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn course_headers(&self) -> Result<Vec<CourseRow>, StorageError>;

    async fn topic_exists(&self, id: TopicId) -> Result<bool, StorageError>;

    /// Number of topics under all chapters of a course.
    async fn count_topics(&self, course: CourseId) -> Result<u64, StorageError>;

    async fn quiz_scope(&self, id: QuizId) -> Result<Option<ActivityScope>, StorageError>;

    async fn game_scope(&self, id: GameId) -> Result<Option<ActivityScope>, StorageError>;

    /// Persist a validated draft atomically and return the new course id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any row cannot be written; nothing is kept
    /// in that case.
    async fn import_course(&self, draft: &CourseDraft) -> Result<CourseId, StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the username is taken.
    async fn insert_user(&self, user: NewUserRecord) -> Result<User, StorageError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Get-or-create the `(user, topic)` row and force `completed = true`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn mark_completed(
        &self,
        user: UserId,
        topic: TopicId,
    ) -> Result<Upserted<UserProgress>, StorageError>;

    /// Completed rows of a user under one course, ordered by topic id.
    async fn completed_in_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<UserProgress>, StorageError>;

    async fn count_completed_in_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Create the attempt or overwrite score and timestamp of the existing one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn upsert_quiz_attempt(
        &self,
        user: UserId,
        quiz: QuizId,
        score: Score,
        at: DateTime<Utc>,
    ) -> Result<Upserted<QuizAttempt>, StorageError>;

    /// Same as [`AttemptRepository::upsert_quiz_attempt`] for games.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn upsert_game_attempt(
        &self,
        user: UserId,
        game: GameId,
        score: Score,
        at: DateTime<Utc>,
    ) -> Result<Upserted<GameAttempt>, StorageError>;

    /// Scores of the user's quiz attempts whose quiz belongs to the course at
    /// any level, one entry per attempt, ordered by attempt id.
    async fn quiz_scores_for_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<f64>, StorageError>;
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogRepository>,
    pub users: Arc<dyn UserRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one repository implementing every trait.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: CatalogRepository
            + UserRepository
            + ProgressRepository
            + AttemptRepository
            + Clone
            + 'static,
    {
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo.clone());
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            catalog,
            users,
            progress,
            attempts,
        }
    }
}
