use academy_core::model::{
    Attempt, CourseId, GameAttempt, GameId, QuizAttempt, QuizId, Score, Upserted, UserId,
};
use chrono::{DateTime, Utc};

use super::SqliteRepository;
use super::mapping::{db_err, id_i64, map_attempt_row};
use crate::repository::{AttemptRepository, StorageError};

/// Table layout shared by `quiz_attempts` and `game_attempts`.
struct AttemptTable {
    table: &'static str,
    activity_column: &'static str,
}

const QUIZ_ATTEMPTS: AttemptTable = AttemptTable {
    table: "quiz_attempts",
    activity_column: "quiz_id",
};

const GAME_ATTEMPTS: AttemptTable = AttemptTable {
    table: "game_attempts",
    activity_column: "game_id",
};

impl SqliteRepository {
    async fn upsert_attempt<A>(
        &self,
        table: &AttemptTable,
        user: UserId,
        activity: u64,
        make: fn(u64) -> A,
        score: Score,
        at: DateTime<Utc>,
    ) -> Result<Upserted<Attempt<A>>, StorageError> {
        let AttemptTable {
            table,
            activity_column,
        } = *table;
        let user_id = id_i64("user_id", user.value())?;
        let activity_id = id_i64(activity_column, activity)?;
        // Autocommit statements only: under WAL a deferred transaction that
        // reads first cannot upgrade to a writer once another commit lands.
        let inserted = sqlx::query(&format!(
            r"
            INSERT INTO {table} (user_id, {activity_column}, score, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, {activity_column}) DO NOTHING
            RETURNING id, user_id, {activity_column}, score, timestamp
            "
        ))
        .bind(user_id)
        .bind(activity_id)
        .bind(score.value())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        if let Some(row) = inserted {
            return Ok(Upserted::created(map_attempt_row(
                &row,
                activity_column,
                make,
            )?));
        }

        let row = sqlx::query(&format!(
            r"
            UPDATE {table} SET score = ?3, timestamp = ?4
            WHERE user_id = ?1 AND {activity_column} = ?2
            RETURNING id, user_id, {activity_column}, score, timestamp
            "
        ))
        .bind(user_id)
        .bind(activity_id)
        .bind(score.value())
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(Upserted::updated(map_attempt_row(
            &row,
            activity_column,
            make,
        )?))
    }
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn upsert_quiz_attempt(
        &self,
        user: UserId,
        quiz: QuizId,
        score: Score,
        at: DateTime<Utc>,
    ) -> Result<Upserted<QuizAttempt>, StorageError> {
        self.upsert_attempt(&QUIZ_ATTEMPTS, user, quiz.value(), QuizId::new, score, at)
            .await
    }

    async fn upsert_game_attempt(
        &self,
        user: UserId,
        game: GameId,
        score: Score,
        at: DateTime<Utc>,
    ) -> Result<Upserted<GameAttempt>, StorageError> {
        self.upsert_attempt(&GAME_ATTEMPTS, user, game.value(), GameId::new, score, at)
            .await
    }

    async fn quiz_scores_for_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<f64>, StorageError> {
        sqlx::query_scalar(
            r"
            SELECT a.score
            FROM quiz_attempts a
            JOIN quiz_courses qc ON qc.quiz_id = a.quiz_id
            WHERE a.user_id = ?1 AND qc.course_id = ?2
            ORDER BY a.id ASC
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .bind(id_i64("course_id", course.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }
}
