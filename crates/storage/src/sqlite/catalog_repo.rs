use academy_core::model::draft::{GameDraft, QuizDraft, order_or_position};
use academy_core::model::{
    ActivityScope, AnswerId, AnswerRow, CatalogRows, ChapterId, ChapterRow, Course, CourseDraft,
    CourseId, CourseRow, GameId, GameRow, PairId, PairRow, QuestionId, QuestionRow, QuizId,
    QuizRow, TopicId, TopicRow,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::SqliteRepository;
use super::mapping::{db_err, get_i32, get_id, id_i64, id_u64, scope_from_row, ser};
use crate::repository::{CatalogRepository, StorageError};

fn course_from_row(row: &SqliteRow) -> Result<CourseRow, StorageError> {
    Ok(CourseRow {
        id: CourseId::new(get_id(row, "id")?),
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
    })
}

fn map_rows<T>(
    rows: &[SqliteRow],
    f: impl Fn(&SqliteRow) -> Result<T, StorageError>,
) -> Result<Vec<T>, StorageError> {
    rows.iter().map(f).collect()
}

impl SqliteRepository {
    /// Fetch the flat rows of one course, or of every course when `course` is `None`.
    async fn load_rows(&self, course: Option<CourseId>) -> Result<CatalogRows, StorageError> {
        let filter = course.map(|c| id_i64("course_id", c.value())).transpose()?;

        let fetch = move |sql: &'static str| {
            sqlx::query(sql)
                .bind(filter)
                .fetch_all(&self.pool)
        };

        let courses = fetch(
            r"
            SELECT id, title, description
            FROM courses
            WHERE (?1 IS NULL OR id = ?1)
            ORDER BY id ASC
            ",
        )
        .await
        .map_err(db_err)?;

        let chapters = fetch(
            r"
            SELECT id, course_id, title, position
            FROM chapters
            WHERE (?1 IS NULL OR course_id = ?1)
            ",
        )
        .await
        .map_err(db_err)?;

        let topics = fetch(
            r"
            SELECT t.id, t.chapter_id, t.title, t.video_url, t.article_content, t.position
            FROM topics t
            JOIN chapters c ON c.id = t.chapter_id
            WHERE (?1 IS NULL OR c.course_id = ?1)
            ",
        )
        .await
        .map_err(db_err)?;

        let quizzes = fetch(
            r"
            SELECT q.id, q.title, q.scope_kind, q.scope_id
            FROM quizzes q
            JOIN quiz_courses qc ON qc.quiz_id = q.id
            WHERE (?1 IS NULL OR qc.course_id = ?1)
            ",
        )
        .await
        .map_err(db_err)?;

        let questions = fetch(
            r"
            SELECT qu.id, qu.quiz_id, qu.text
            FROM questions qu
            JOIN quiz_courses qc ON qc.quiz_id = qu.quiz_id
            WHERE (?1 IS NULL OR qc.course_id = ?1)
            ",
        )
        .await
        .map_err(db_err)?;

        let answers = fetch(
            r"
            SELECT a.id, a.question_id, a.text, a.is_correct
            FROM answers a
            JOIN questions qu ON qu.id = a.question_id
            JOIN quiz_courses qc ON qc.quiz_id = qu.quiz_id
            WHERE (?1 IS NULL OR qc.course_id = ?1)
            ",
        )
        .await
        .map_err(db_err)?;

        let games = fetch(
            r"
            SELECT g.id, g.title, g.scope_kind, g.scope_id
            FROM matching_games g
            JOIN game_courses gc ON gc.game_id = g.id
            WHERE (?1 IS NULL OR gc.course_id = ?1)
            ",
        )
        .await
        .map_err(db_err)?;

        let pairs = fetch(
            r"
            SELECT p.id, p.game_id, p.item_a, p.item_b
            FROM matching_pairs p
            JOIN game_courses gc ON gc.game_id = p.game_id
            WHERE (?1 IS NULL OR gc.course_id = ?1)
            ",
        )
        .await
        .map_err(db_err)?;

        Ok(CatalogRows {
            courses: map_rows(&courses, course_from_row)?,
            chapters: map_rows(&chapters, |row| {
                Ok(ChapterRow {
                    id: ChapterId::new(get_id(row, "id")?),
                    course_id: CourseId::new(get_id(row, "course_id")?),
                    title: row.try_get("title").map_err(ser)?,
                    order: get_i32(row, "position")?,
                })
            })?,
            topics: map_rows(&topics, |row| {
                Ok(TopicRow {
                    id: TopicId::new(get_id(row, "id")?),
                    chapter_id: ChapterId::new(get_id(row, "chapter_id")?),
                    title: row.try_get("title").map_err(ser)?,
                    video_url: row.try_get("video_url").map_err(ser)?,
                    article_content: row.try_get("article_content").map_err(ser)?,
                    order: get_i32(row, "position")?,
                })
            })?,
            quizzes: map_rows(&quizzes, |row| {
                Ok(QuizRow {
                    id: QuizId::new(get_id(row, "id")?),
                    title: row.try_get("title").map_err(ser)?,
                    scope: scope_from_row(row)?,
                })
            })?,
            questions: map_rows(&questions, |row| {
                Ok(QuestionRow {
                    id: QuestionId::new(get_id(row, "id")?),
                    quiz_id: QuizId::new(get_id(row, "quiz_id")?),
                    text: row.try_get("text").map_err(ser)?,
                })
            })?,
            answers: map_rows(&answers, |row| {
                Ok(AnswerRow {
                    id: AnswerId::new(get_id(row, "id")?),
                    question_id: QuestionId::new(get_id(row, "question_id")?),
                    text: row.try_get("text").map_err(ser)?,
                    is_correct: row.try_get("is_correct").map_err(ser)?,
                })
            })?,
            games: map_rows(&games, |row| {
                Ok(GameRow {
                    id: GameId::new(get_id(row, "id")?),
                    title: row.try_get("title").map_err(ser)?,
                    scope: scope_from_row(row)?,
                })
            })?,
            pairs: map_rows(&pairs, |row| {
                Ok(PairRow {
                    id: PairId::new(get_id(row, "id")?),
                    game_id: GameId::new(get_id(row, "game_id")?),
                    item_a: row.try_get("item_a").map_err(ser)?,
                    item_b: row.try_get("item_b").map_err(ser)?,
                })
            })?,
        })
    }

    async fn activity_scope(
        &self,
        sql: &'static str,
        id: u64,
    ) -> Result<Option<ActivityScope>, StorageError> {
        let row = sqlx::query(sql)
            .bind(id_i64("activity_id", id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(scope_from_row).transpose()
    }
}

async fn insert_activities(
    conn: &mut SqliteConnection,
    scope: ActivityScope,
    quiz: Option<&QuizDraft>,
    game: Option<&GameDraft>,
) -> Result<(), StorageError> {
    let scope_id = id_i64("scope_id", scope.target_id())?;

    if let Some(quiz) = quiz {
        let quiz_id = sqlx::query(
            "INSERT INTO quizzes (title, scope_kind, scope_id) VALUES (?1, ?2, ?3)",
        )
        .bind(quiz.title.trim())
        .bind(scope.kind())
        .bind(scope_id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        for question in &quiz.questions {
            let question_id = sqlx::query("INSERT INTO questions (quiz_id, text) VALUES (?1, ?2)")
                .bind(quiz_id)
                .bind(&question.text)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?
                .last_insert_rowid();

            for answer in &question.answers {
                sqlx::query(
                    "INSERT INTO answers (question_id, text, is_correct) VALUES (?1, ?2, ?3)",
                )
                .bind(question_id)
                .bind(&answer.text)
                .bind(answer.is_correct)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            }
        }
    }

    if let Some(game) = game {
        let game_id = sqlx::query(
            "INSERT INTO matching_games (title, scope_kind, scope_id) VALUES (?1, ?2, ?3)",
        )
        .bind(game.title.trim())
        .bind(scope.kind())
        .bind(scope_id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        for pair in &game.pairs {
            sqlx::query("INSERT INTO matching_pairs (game_id, item_a, item_b) VALUES (?1, ?2, ?3)")
                .bind(game_id)
                .bind(&pair.item_a)
                .bind(&pair.item_b)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
        }
    }

    Ok(())
}

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        Ok(self.load_rows(None).await?.assemble())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(self.load_rows(Some(id)).await?.assemble().pop())
    }

    async fn course_headers(&self) -> Result<Vec<CourseRow>, StorageError> {
        let rows = sqlx::query("SELECT id, title, description FROM courses ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        map_rows(&rows, course_from_row)
    }

    async fn topic_exists(&self, id: TopicId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM topics WHERE id = ?1")
            .bind(id_i64("topic_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.is_some())
    }

    async fn count_topics(&self, course: CourseId) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM topics t
            JOIN chapters c ON c.id = t.chapter_id
            WHERE c.course_id = ?1
            ",
        )
        .bind(id_i64("course_id", course.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        u64::try_from(count).map_err(ser)
    }

    async fn quiz_scope(&self, id: QuizId) -> Result<Option<ActivityScope>, StorageError> {
        self.activity_scope(
            "SELECT scope_kind, scope_id FROM quizzes WHERE id = ?1",
            id.value(),
        )
        .await
    }

    async fn game_scope(&self, id: GameId) -> Result<Option<ActivityScope>, StorageError> {
        self.activity_scope(
            "SELECT scope_kind, scope_id FROM matching_games WHERE id = ?1",
            id.value(),
        )
        .await
    }

    async fn import_course(&self, draft: &CourseDraft) -> Result<CourseId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let course_id = sqlx::query("INSERT INTO courses (title, description) VALUES (?1, ?2)")
            .bind(draft.title.trim())
            .bind(&draft.description)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .last_insert_rowid();
        let course = CourseId::new(id_u64("course_id", course_id)?);
        insert_activities(
            &mut *tx,
            ActivityScope::Course(course),
            draft.quiz.as_ref(),
            draft.game.as_ref(),
        )
        .await?;

        for (ci, chapter) in draft.chapters.iter().enumerate() {
            let chapter_id = sqlx::query(
                "INSERT INTO chapters (course_id, title, position) VALUES (?1, ?2, ?3)",
            )
            .bind(course_id)
            .bind(chapter.title.trim())
            .bind(order_or_position(chapter.order, ci))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .last_insert_rowid();
            let chapter_scope =
                ActivityScope::Chapter(ChapterId::new(id_u64("chapter_id", chapter_id)?));
            insert_activities(
                &mut *tx,
                chapter_scope,
                chapter.quiz.as_ref(),
                chapter.game.as_ref(),
            )
            .await?;

            for (ti, topic) in chapter.topics.iter().enumerate() {
                let topic_id = sqlx::query(
                    r"
                    INSERT INTO topics (chapter_id, title, video_url, article_content, position)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ",
                )
                .bind(chapter_id)
                .bind(topic.title.trim())
                .bind(topic.normalized_video_url())
                .bind(topic.article_content.as_deref())
                .bind(order_or_position(topic.order, ti))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?
                .last_insert_rowid();
                let topic_scope =
                    ActivityScope::Topic(TopicId::new(id_u64("topic_id", topic_id)?));
                insert_activities(&mut *tx, topic_scope, topic.quiz.as_ref(), topic.game.as_ref())
                    .await?;
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(course)
    }
}
