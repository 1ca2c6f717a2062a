use academy_core::model::{
    ActivityScope, Attempt, AttemptId, ProgressId, Score, TopicId, User, UserId, UserProgress,
    Username,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{StorageError, UserRecord};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Classify driver errors: constraint failures keep their meaning, the rest
/// is a connection problem.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn id_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn get_id(row: &SqliteRow, column: &'static str) -> Result<u64, StorageError> {
    id_u64(column, row.try_get::<i64, _>(column).map_err(ser)?)
}

pub(crate) fn get_i32(row: &SqliteRow, column: &'static str) -> Result<i32, StorageError> {
    let raw: i64 = row.try_get(column).map_err(ser)?;
    i32::try_from(raw).map_err(|_| StorageError::Serialization(format!("invalid {column}: {raw}")))
}

pub(crate) fn scope_from_row(row: &SqliteRow) -> Result<ActivityScope, StorageError> {
    let kind: String = row.try_get("scope_kind").map_err(ser)?;
    let id = get_id(row, "scope_id")?;
    ActivityScope::from_parts(&kind, id).map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<UserRecord, StorageError> {
    let username: String = row.try_get("username").map_err(ser)?;
    Ok(UserRecord {
        user: User {
            id: UserId::new(get_id(row, "id")?),
            username: Username::parse(username).map_err(ser)?,
            email: row.try_get("email").map_err(ser)?,
            first_name: row.try_get("first_name").map_err(ser)?,
            last_name: row.try_get("last_name").map_err(ser)?,
            date_joined: row.try_get("date_joined").map_err(ser)?,
        },
        password_hash: row.try_get("password_hash").map_err(ser)?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<UserProgress, StorageError> {
    Ok(UserProgress {
        id: ProgressId::new(get_id(row, "id")?),
        user: UserId::new(get_id(row, "user_id")?),
        topic: TopicId::new(get_id(row, "topic_id")?),
        completed: row.try_get("completed").map_err(ser)?,
    })
}

/// Maps an attempt row; `activity_column` is `quiz_id` or `game_id`.
pub(crate) fn map_attempt_row<A>(
    row: &SqliteRow,
    activity_column: &'static str,
    make: fn(u64) -> A,
) -> Result<Attempt<A>, StorageError> {
    let score: f64 = row.try_get("score").map_err(ser)?;
    Ok(Attempt {
        id: AttemptId::new(get_id(row, "id")?),
        user: UserId::new(get_id(row, "user_id")?),
        activity: make(get_id(row, activity_column)?),
        score: Score::new(score).map_err(ser)?,
        timestamp: row.try_get("timestamp").map_err(ser)?,
    })
}
