use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::Storage;

mod attempt_repo;
mod catalog_repo;
mod mapping;
mod migrate;
mod progress_repo;
mod user_repo;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Course catalog, accounts, progress and attempts in one `SQLite` database.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open a pool on `database_url` with foreign keys enforced, WAL journaling
    /// and a busy timeout so concurrent attempt submissions queue up.
    ///
    /// # Errors
    ///
    /// Fails when the URL does not parse or the database cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(BUSY_TIMEOUT)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the catalog, account and ledger tables plus the
    /// activity-to-course views.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` when a schema statement fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Connect, migrate and expose every repository over one pool.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` from either step.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self::from_repository(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn migrated(name: &str) -> SqliteRepository {
        let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
        let repo = SqliteRepository::connect(&url).await.unwrap();
        repo.migrate().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn schema_rejects_unknown_scope_kind() {
        let repo = migrated("memdb_scope_check").await;
        let err = sqlx::query("INSERT INTO quizzes (title, scope_kind, scope_id) VALUES ('q', 'lesson', 1)")
            .execute(repo.pool())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("CHECK"));
    }

    #[tokio::test]
    async fn schema_allows_one_game_per_scope() {
        let repo = migrated("memdb_scope_unique").await;
        let insert = "INSERT INTO matching_games (title, scope_kind, scope_id) VALUES ('g', 'course', 7)";
        sqlx::query(insert).execute(repo.pool()).await.unwrap();
        let err = sqlx::query(insert).execute(repo.pool()).await.unwrap_err();
        let unique = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        assert!(unique);
    }

    #[tokio::test]
    async fn migrate_twice_is_harmless() {
        let repo = migrated("memdb_migrate_twice").await;
        repo.migrate().await.unwrap();
    }
}
