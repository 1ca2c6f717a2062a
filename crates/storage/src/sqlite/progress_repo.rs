use academy_core::model::{CourseId, TopicId, Upserted, UserId, UserProgress};

use super::SqliteRepository;
use super::mapping::{db_err, id_i64, map_progress_row, ser};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn mark_completed(
        &self,
        user: UserId,
        topic: TopicId,
    ) -> Result<Upserted<UserProgress>, StorageError> {
        let user_id = id_i64("user_id", user.value())?;
        let topic_id = id_i64("topic_id", topic.value())?;
        let inserted = sqlx::query(
            r"
            INSERT INTO user_progress (user_id, topic_id, completed)
            VALUES (?1, ?2, 1)
            ON CONFLICT(user_id, topic_id) DO NOTHING
            RETURNING id, user_id, topic_id, completed
            ",
        )
        .bind(user_id)
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        if let Some(row) = inserted {
            return Ok(Upserted::created(map_progress_row(&row)?));
        }

        let row = sqlx::query(
            r"
            UPDATE user_progress SET completed = 1
            WHERE user_id = ?1 AND topic_id = ?2
            RETURNING id, user_id, topic_id, completed
            ",
        )
        .bind(user_id)
        .bind(topic_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(Upserted::updated(map_progress_row(&row)?))
    }

    async fn completed_in_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<UserProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT p.id, p.user_id, p.topic_id, p.completed
            FROM user_progress p
            JOIN topics t ON t.id = p.topic_id
            JOIN chapters c ON c.id = t.chapter_id
            WHERE p.user_id = ?1 AND c.course_id = ?2 AND p.completed = 1
            ORDER BY p.topic_id ASC
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .bind(id_i64("course_id", course.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn count_completed_in_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM user_progress p
            JOIN topics t ON t.id = p.topic_id
            JOIN chapters c ON c.id = t.chapter_id
            WHERE p.user_id = ?1 AND c.course_id = ?2 AND p.completed = 1
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .bind(id_i64("course_id", course.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        u64::try_from(count).map_err(ser)
    }
}
