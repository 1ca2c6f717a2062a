use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS chapters (
            id INTEGER PRIMARY KEY,
            course_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            position INTEGER NOT NULL,
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY,
            chapter_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            video_url TEXT,
            article_content TEXT,
            position INTEGER NOT NULL,
            FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quizzes (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            scope_kind TEXT NOT NULL CHECK (scope_kind IN ('course', 'chapter', 'topic')),
            scope_id INTEGER NOT NULL,
            UNIQUE (scope_kind, scope_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            quiz_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS answers (
            id INTEGER PRIMARY KEY,
            question_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            is_correct INTEGER NOT NULL DEFAULT 0 CHECK (is_correct IN (0, 1)),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS matching_games (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            scope_kind TEXT NOT NULL CHECK (scope_kind IN ('course', 'chapter', 'topic')),
            scope_id INTEGER NOT NULL,
            UNIQUE (scope_kind, scope_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS matching_pairs (
            id INTEGER PRIMARY KEY,
            game_id INTEGER NOT NULL,
            item_a TEXT NOT NULL,
            item_b TEXT NOT NULL,
            FOREIGN KEY (game_id) REFERENCES matching_games(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL DEFAULT '',
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            date_joined TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS user_progress (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            topic_id INTEGER NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
            UNIQUE (user_id, topic_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_attempts (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            quiz_id INTEGER NOT NULL,
            score REAL NOT NULL CHECK (score >= 0 AND score <= 100),
            timestamp TEXT NOT NULL,
            UNIQUE (user_id, quiz_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS game_attempts (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            score REAL NOT NULL CHECK (score >= 0 AND score <= 100),
            timestamp TEXT NOT NULL,
            UNIQUE (user_id, game_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (game_id) REFERENCES matching_games(id) ON DELETE CASCADE
        );
    ",
    // Resolves every quiz to the course it belongs to, whatever its scope.
    r"
        CREATE VIEW IF NOT EXISTS quiz_courses AS
            SELECT q.id AS quiz_id, q.scope_id AS course_id
            FROM quizzes q
            WHERE q.scope_kind = 'course'
            UNION ALL
            SELECT q.id, c.course_id
            FROM quizzes q
            JOIN chapters c ON q.scope_kind = 'chapter' AND c.id = q.scope_id
            UNION ALL
            SELECT q.id, c.course_id
            FROM quizzes q
            JOIN topics t ON q.scope_kind = 'topic' AND t.id = q.scope_id
            JOIN chapters c ON c.id = t.chapter_id;
    ",
    r"
        CREATE VIEW IF NOT EXISTS game_courses AS
            SELECT g.id AS game_id, g.scope_id AS course_id
            FROM matching_games g
            WHERE g.scope_kind = 'course'
            UNION ALL
            SELECT g.id, c.course_id
            FROM matching_games g
            JOIN chapters c ON g.scope_kind = 'chapter' AND c.id = g.scope_id
            UNION ALL
            SELECT g.id, c.course_id
            FROM matching_games g
            JOIN topics t ON g.scope_kind = 'topic' AND t.id = g.scope_id
            JOIN chapters c ON c.id = t.chapter_id;
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_chapters_course ON chapters (course_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_topics_chapter ON topics (chapter_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user ON quiz_attempts (user_id, quiz_id);
    ",
];

/// Applies pending schema versions.
///
/// Version 1 creates the content hierarchy, accounts, progress and attempt
/// ledgers, plus the scope → course views used by the stats queries.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
