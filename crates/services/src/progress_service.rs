use std::sync::Arc;

use academy_core::model::{
    ActivityScope, CourseId, GameAttempt, GameId, QuizAttempt, QuizId, Score, TopicId, Upserted,
    UserId, UserProgress,
};
use storage::repository::{AttemptRepository, CatalogRepository, ProgressRepository};
use tracing::{debug, warn};

use crate::Clock;
use crate::error::ProgressError;

/// Attempt submission and topic completion for one user at a time.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    catalog: Arc<dyn CatalogRepository>,
    progress: Arc<dyn ProgressRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn CatalogRepository>,
        progress: Arc<dyn ProgressRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            progress,
            attempts,
        }
    }

    /// Record the latest quiz score of `user`.
    ///
    /// A topic-level quiz also marks its topic as completed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Validation` when the id or score is missing or
    /// the score is out of range.
    /// Returns `ProgressError::NotFound` for an unknown quiz.
    /// Returns `ProgressError::Storage` if persistence fails.
    pub async fn submit_quiz_score(
        &self,
        user: UserId,
        quiz: Option<QuizId>,
        score: Option<f64>,
    ) -> Result<Upserted<QuizAttempt>, ProgressError> {
        let (Some(quiz), Some(score)) = (quiz, score) else {
            return Err(ProgressError::Validation(
                "quiz_id and score are required.".into(),
            ));
        };
        let score = Score::new(score)?;
        let scope = self
            .catalog
            .quiz_scope(quiz)
            .await?
            .ok_or(ProgressError::NotFound("Quiz"))?;

        let attempt = self
            .attempts
            .upsert_quiz_attempt(user, quiz, score, self.clock.now())
            .await?;
        debug!(%user, %quiz, score = score.value(), created = attempt.created, "quiz attempt saved");

        self.complete_scoped_topic(user, scope).await;
        Ok(attempt)
    }

    /// Record the latest matching-game score of `user`.
    ///
    /// # Errors
    ///
    /// Same as [`ProgressService::submit_quiz_score`], for games.
    pub async fn submit_game_score(
        &self,
        user: UserId,
        game: Option<GameId>,
        score: Option<f64>,
    ) -> Result<Upserted<GameAttempt>, ProgressError> {
        let (Some(game), Some(score)) = (game, score) else {
            return Err(ProgressError::Validation(
                "game_id and score are required.".into(),
            ));
        };
        let score = Score::new(score)?;
        let scope = self
            .catalog
            .game_scope(game)
            .await?
            .ok_or(ProgressError::NotFound("MatchingGame"))?;

        let attempt = self
            .attempts
            .upsert_game_attempt(user, game, score, self.clock.now())
            .await?;
        debug!(%user, %game, score = score.value(), created = attempt.created, "game attempt saved");

        self.complete_scoped_topic(user, scope).await;
        Ok(attempt)
    }

    /// Mark a topic as completed, creating the progress row if needed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotFound` for an unknown topic.
    /// Returns `ProgressError::Storage` if persistence fails.
    pub async fn mark_topic_complete(
        &self,
        user: UserId,
        topic: TopicId,
    ) -> Result<UserProgress, ProgressError> {
        if !self.catalog.topic_exists(topic).await? {
            return Err(ProgressError::NotFound("Topic"));
        }
        Ok(self.progress.mark_completed(user, topic).await?.value)
    }

    /// Completed topics of `user` inside one course, ordered by topic id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<UserProgress>, ProgressError> {
        Ok(self.progress.completed_in_course(user, course).await?)
    }

    async fn complete_scoped_topic(&self, user: UserId, scope: ActivityScope) {
        let Some(topic) = scope.topic() else {
            return;
        };
        if let Err(err) = self.progress.mark_completed(user, topic).await {
            warn!(%user, %topic, error = %err, "could not mark topic completed after attempt");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::model::{CourseDraft, Username};
    use academy_core::time::{fixed_clock, fixed_now};
    use storage::repository::{NewUserRecord, Storage, StorageError};

    struct Fixture {
        service: ProgressService,
        storage: Storage,
        course: CourseId,
        ana: UserId,
    }

    async fn fixture() -> Fixture {
        let storage = Storage::in_memory();
        let draft: CourseDraft = serde_json::from_str(
            r#"{
                "title": "Rust",
                "quiz": {"title": "Final"},
                "chapters": [{
                    "title": "Basics",
                    "topics": [
                        {"title": "Hello", "quiz": {"title": "Hello quiz"}, "game": {"title": "Pairs"}},
                        {"title": "Loops"}
                    ]
                }]
            }"#,
        )
        .unwrap();
        let course = storage.catalog.import_course(&draft).await.unwrap();
        let ana = storage
            .users
            .insert_user(NewUserRecord {
                username: Username::parse("ana").unwrap(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "hash".into(),
                date_joined: fixed_now(),
            })
            .await
            .unwrap()
            .id;
        let service = ProgressService::new(
            fixed_clock(),
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.attempts),
        );
        Fixture {
            service,
            storage,
            course,
            ana,
        }
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let f = fixture().await;
        let err = f
            .service
            .submit_quiz_score(f.ana, None, Some(10.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quiz_id and score are required.");

        let err = f
            .service
            .submit_game_score(f.ana, Some(GameId::new(1)), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "game_id and score are required.");
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .submit_quiz_score(f.ana, Some(QuizId::new(1)), Some(120.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_activity_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .submit_quiz_score(f.ana, Some(QuizId::new(999)), Some(50.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Quiz not found");

        let err = f
            .service
            .submit_game_score(f.ana, Some(GameId::new(999)), Some(50.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "MatchingGame not found");
    }

    #[tokio::test]
    async fn topic_quiz_completes_topic_once() {
        let f = fixture().await;
        let course = f.storage.catalog.get_course(f.course).await.unwrap().unwrap();
        let hello = &course.chapters[0].topics[0];
        let quiz = hello.topic_quiz.as_ref().unwrap().id;

        let first = f
            .service
            .submit_quiz_score(f.ana, Some(quiz), Some(40.0))
            .await
            .unwrap();
        let second = f
            .service
            .submit_quiz_score(f.ana, Some(quiz), Some(80.0))
            .await
            .unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.value.score.value(), 80.0);

        let rows = f.service.course_progress(f.ana, f.course).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].topic, hello.id);
        assert!(rows[0].completed);
    }

    #[tokio::test]
    async fn course_quiz_does_not_complete_topics() {
        let f = fixture().await;
        let course = f.storage.catalog.get_course(f.course).await.unwrap().unwrap();
        let quiz = course.course_quiz.unwrap().id;
        f.service
            .submit_quiz_score(f.ana, Some(quiz), Some(100.0))
            .await
            .unwrap();
        assert!(f.service.course_progress(f.ana, f.course).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn topic_game_completes_topic() {
        let f = fixture().await;
        let course = f.storage.catalog.get_course(f.course).await.unwrap().unwrap();
        let game = course.chapters[0].topics[0].matching_game.as_ref().unwrap().id;
        f.service
            .submit_game_score(f.ana, Some(game), Some(100.0))
            .await
            .unwrap();
        assert_eq!(f.service.course_progress(f.ana, f.course).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn manual_completion_is_idempotent() {
        let f = fixture().await;
        let course = f.storage.catalog.get_course(f.course).await.unwrap().unwrap();
        let loops = course.chapters[0].topics[1].id;

        let first = f.service.mark_topic_complete(f.ana, loops).await.unwrap();
        let second = f.service.mark_topic_complete(f.ana, loops).await.unwrap();
        assert_eq!(first, second);

        let err = f
            .service
            .mark_topic_complete(f.ana, TopicId::new(404))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Topic not found");
    }

    #[tokio::test]
    async fn unknown_course_has_no_progress() {
        let f = fixture().await;
        let rows = f.service.course_progress(f.ana, CourseId::new(77)).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unregistered_user_cannot_submit() {
        let f = fixture().await;
        let course = f.storage.catalog.get_course(f.course).await.unwrap().unwrap();
        let quiz = course.course_quiz.unwrap().id;
        let err = f
            .service
            .submit_quiz_score(UserId::new(4_242), Some(quiz), Some(50.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::Storage(StorageError::NotFound)));
    }
}
