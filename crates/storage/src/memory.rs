use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use academy_core::model::draft::{GameDraft, QuizDraft, order_or_position};
use academy_core::model::{
    ActivityScope, AnswerId, AnswerRow, Attempt, AttemptId, CatalogRows, ChapterId, ChapterRow,
    Course, CourseDraft, CourseId, CourseRow, GameAttempt, GameId, GameRow, PairId, PairRow,
    ProgressId, QuestionId, QuestionRow, QuizAttempt, QuizId, QuizRow, Score, TopicId, TopicRow,
    Upserted, User, UserId, UserProgress,
};

use crate::repository::{
    AttemptRepository, CatalogRepository, NewUserRecord, ProgressRepository, StorageError,
    UserRecord, UserRepository,
};

#[derive(Default)]
struct MemoryState {
    last_id: u64,
    catalog: CatalogRows,
    users: BTreeMap<UserId, UserRecord>,
    progress: BTreeMap<(UserId, TopicId), UserProgress>,
    quiz_attempts: HashMap<(UserId, QuizId), QuizAttempt>,
    game_attempts: HashMap<(UserId, GameId), GameAttempt>,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn chapter_course(&self, chapter: ChapterId) -> Option<CourseId> {
        self.catalog
            .chapters
            .iter()
            .find(|c| c.id == chapter)
            .map(|c| c.course_id)
    }

    fn topic_course(&self, topic: TopicId) -> Option<CourseId> {
        self.catalog
            .topics
            .iter()
            .find(|t| t.id == topic)
            .and_then(|t| self.chapter_course(t.chapter_id))
    }

    fn scope_course(&self, scope: ActivityScope) -> Option<CourseId> {
        match scope {
            ActivityScope::Course(id) => Some(id),
            ActivityScope::Chapter(id) => self.chapter_course(id),
            ActivityScope::Topic(id) => self.topic_course(id),
        }
    }

    fn rows_for(&self, course: Option<CourseId>) -> CatalogRows {
        let wanted = |id: CourseId| course.is_none_or(|c| c == id);
        let rows = &self.catalog;
        let mut courses: Vec<CourseRow> = rows
            .courses
            .iter()
            .filter(|c| wanted(c.id))
            .cloned()
            .collect();
        courses.sort_by_key(|c| c.id);

        let quizzes: Vec<QuizRow> = rows
            .quizzes
            .iter()
            .filter(|q| self.scope_course(q.scope).is_some_and(wanted))
            .cloned()
            .collect();
        let games: Vec<GameRow> = rows
            .games
            .iter()
            .filter(|g| self.scope_course(g.scope).is_some_and(wanted))
            .cloned()
            .collect();

        let questions: Vec<QuestionRow> = rows
            .questions
            .iter()
            .filter(|q| quizzes.iter().any(|quiz| quiz.id == q.quiz_id))
            .cloned()
            .collect();
        let answers = rows
            .answers
            .iter()
            .filter(|a| questions.iter().any(|q| q.id == a.question_id))
            .cloned()
            .collect();

        CatalogRows {
            courses,
            chapters: rows
                .chapters
                .iter()
                .filter(|c| wanted(c.course_id))
                .cloned()
                .collect(),
            topics: rows
                .topics
                .iter()
                .filter(|t| self.chapter_course(t.chapter_id).is_some_and(wanted))
                .cloned()
                .collect(),
            questions,
            answers,
            pairs: rows
                .pairs
                .iter()
                .filter(|p| games.iter().any(|g| g.id == p.game_id))
                .cloned()
                .collect(),
            quizzes,
            games,
        }
    }

    fn import(&mut self, draft: &CourseDraft) -> CourseId {
        let course_id = CourseId::new(self.next_id());
        self.catalog.courses.push(CourseRow {
            id: course_id,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
        });
        self.import_activities(
            ActivityScope::Course(course_id),
            draft.quiz.as_ref(),
            draft.game.as_ref(),
        );

        for (ci, chapter) in draft.chapters.iter().enumerate() {
            let chapter_id = ChapterId::new(self.next_id());
            self.catalog.chapters.push(ChapterRow {
                id: chapter_id,
                course_id,
                title: chapter.title.trim().to_string(),
                order: order_or_position(chapter.order, ci),
            });
            self.import_activities(
                ActivityScope::Chapter(chapter_id),
                chapter.quiz.as_ref(),
                chapter.game.as_ref(),
            );

            for (ti, topic) in chapter.topics.iter().enumerate() {
                let topic_id = TopicId::new(self.next_id());
                self.catalog.topics.push(TopicRow {
                    id: topic_id,
                    chapter_id,
                    title: topic.title.trim().to_string(),
                    video_url: topic.normalized_video_url(),
                    article_content: topic.article_content.clone(),
                    order: order_or_position(topic.order, ti),
                });
                self.import_activities(
                    ActivityScope::Topic(topic_id),
                    topic.quiz.as_ref(),
                    topic.game.as_ref(),
                );
            }
        }
        course_id
    }

    fn import_activities(
        &mut self,
        scope: ActivityScope,
        quiz: Option<&QuizDraft>,
        game: Option<&GameDraft>,
    ) {
        if let Some(quiz) = quiz {
            let quiz_id = QuizId::new(self.next_id());
            self.catalog.quizzes.push(QuizRow {
                id: quiz_id,
                title: quiz.title.trim().to_string(),
                scope,
            });
            for question in &quiz.questions {
                let question_id = QuestionId::new(self.next_id());
                self.catalog.questions.push(QuestionRow {
                    id: question_id,
                    quiz_id,
                    text: question.text.clone(),
                });
                for answer in &question.answers {
                    let id = AnswerId::new(self.next_id());
                    self.catalog.answers.push(AnswerRow {
                        id,
                        question_id,
                        text: answer.text.clone(),
                        is_correct: answer.is_correct,
                    });
                }
            }
        }
        if let Some(game) = game {
            let game_id = GameId::new(self.next_id());
            self.catalog.games.push(GameRow {
                id: game_id,
                title: game.title.trim().to_string(),
                scope,
            });
            for pair in &game.pairs {
                let id = PairId::new(self.next_id());
                self.catalog.pairs.push(PairRow {
                    id,
                    game_id,
                    item_a: pair.item_a.clone(),
                    item_b: pair.item_b.clone(),
                });
            }
        }
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.rows_for(None).assemble())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.rows_for(Some(id)).assemble().pop())
    }

    async fn course_headers(&self) -> Result<Vec<CourseRow>, StorageError> {
        let guard = self.lock()?;
        let mut courses = guard.catalog.courses.clone();
        courses.sort_by_key(|c| c.id);
        Ok(courses)
    }

    async fn topic_exists(&self, id: TopicId) -> Result<bool, StorageError> {
        let guard = self.lock()?;
        Ok(guard.catalog.topics.iter().any(|t| t.id == id))
    }

    async fn count_topics(&self, course: CourseId) -> Result<u64, StorageError> {
        let guard = self.lock()?;
        let count = guard
            .catalog
            .topics
            .iter()
            .filter(|t| guard.chapter_course(t.chapter_id) == Some(course))
            .count();
        Ok(count as u64)
    }

    async fn quiz_scope(&self, id: QuizId) -> Result<Option<ActivityScope>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .catalog
            .quizzes
            .iter()
            .find(|q| q.id == id)
            .map(|q| q.scope))
    }

    async fn game_scope(&self, id: GameId) -> Result<Option<ActivityScope>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .catalog
            .games
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.scope))
    }

    async fn import_course(&self, draft: &CourseDraft) -> Result<CourseId, StorageError> {
        let mut guard = self.lock()?;
        Ok(guard.import(draft))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<User, StorageError> {
        let mut guard = self.lock()?;
        if guard
            .users
            .values()
            .any(|r| r.user.username == user.username)
        {
            return Err(StorageError::Conflict);
        }
        let id = UserId::new(guard.next_id());
        let created = User {
            id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.date_joined,
        };
        guard.users.insert(
            id,
            UserRecord {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .users
            .values()
            .find(|r| r.user.username.as_str() == username)
            .cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.users.get(&id).map(|r| r.user.clone()))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn mark_completed(
        &self,
        user: UserId,
        topic: TopicId,
    ) -> Result<Upserted<UserProgress>, StorageError> {
        let mut guard = self.lock()?;
        let known = guard.users.contains_key(&user)
            && guard.catalog.topics.iter().any(|t| t.id == topic);
        if !known {
            return Err(StorageError::NotFound);
        }
        if let Some(existing) = guard.progress.get_mut(&(user, topic)) {
            existing.completed = true;
            return Ok(Upserted::updated(existing.clone()));
        }
        let row = UserProgress {
            id: ProgressId::new(guard.next_id()),
            user,
            topic,
            completed: true,
        };
        guard.progress.insert((user, topic), row.clone());
        Ok(Upserted::created(row))
    }

    async fn completed_in_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<UserProgress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .progress
            .range((user, TopicId::new(0))..=(user, TopicId::new(u64::MAX)))
            .map(|(_, p)| p)
            .filter(|p| p.completed && guard.topic_course(p.topic) == Some(course))
            .cloned()
            .collect())
    }

    async fn count_completed_in_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<u64, StorageError> {
        let rows = self.completed_in_course(user, course).await?;
        Ok(rows.len() as u64)
    }
}

fn upsert_attempt<A: Copy + Eq + std::hash::Hash>(
    table: &mut HashMap<(UserId, A), Attempt<A>>,
    last_id: &mut u64,
    user: UserId,
    activity: A,
    score: Score,
    at: DateTime<Utc>,
) -> Upserted<Attempt<A>> {
    if let Some(existing) = table.get_mut(&(user, activity)) {
        existing.score = score;
        existing.timestamp = at;
        return Upserted::updated(existing.clone());
    }
    *last_id += 1;
    let attempt = Attempt {
        id: AttemptId::new(*last_id),
        user,
        activity,
        score,
        timestamp: at,
    };
    table.insert((user, activity), attempt.clone());
    Upserted::created(attempt)
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn upsert_quiz_attempt(
        &self,
        user: UserId,
        quiz: QuizId,
        score: Score,
        at: DateTime<Utc>,
    ) -> Result<Upserted<QuizAttempt>, StorageError> {
        let mut guard = self.lock()?;
        let known = guard.users.contains_key(&user)
            && guard.catalog.quizzes.iter().any(|q| q.id == quiz);
        if !known {
            return Err(StorageError::NotFound);
        }
        let state = &mut *guard;
        Ok(upsert_attempt(
            &mut state.quiz_attempts,
            &mut state.last_id,
            user,
            quiz,
            score,
            at,
        ))
    }

    async fn upsert_game_attempt(
        &self,
        user: UserId,
        game: GameId,
        score: Score,
        at: DateTime<Utc>,
    ) -> Result<Upserted<GameAttempt>, StorageError> {
        let mut guard = self.lock()?;
        let known = guard.users.contains_key(&user)
            && guard.catalog.games.iter().any(|g| g.id == game);
        if !known {
            return Err(StorageError::NotFound);
        }
        let state = &mut *guard;
        Ok(upsert_attempt(
            &mut state.game_attempts,
            &mut state.last_id,
            user,
            game,
            score,
            at,
        ))
    }

    async fn quiz_scores_for_course(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Vec<f64>, StorageError> {
        let guard = self.lock()?;
        let mut attempts: Vec<&QuizAttempt> = guard
            .quiz_attempts
            .values()
            .filter(|a| a.user == user)
            .filter(|a| {
                guard
                    .catalog
                    .quizzes
                    .iter()
                    .find(|q| q.id == a.activity)
                    .and_then(|q| guard.scope_course(q.scope))
                    == Some(course)
            })
            .collect();
        attempts.sort_by_key(|a| a.id);
        Ok(attempts.into_iter().map(|a| a.score.value()).collect())
    }
}
