//! Request and response bodies that differ from the domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use academy_core::model::{AttemptId, GameAttempt, GameId, QuizAttempt, QuizId, User};

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub quiz_id: Option<QuizId>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitGameRequest {
    #[serde(default)]
    pub game_id: Option<GameId>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

/// Attempt as returned to clients; `user` is the username.
#[derive(Debug, Serialize)]
pub struct QuizAttemptResponse {
    pub id: AttemptId,
    pub user: String,
    pub quiz: QuizId,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GameAttemptResponse {
    pub id: AttemptId,
    pub user: String,
    pub game: GameId,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl QuizAttemptResponse {
    #[must_use]
    pub fn new(attempt: &QuizAttempt, user: &User) -> Self {
        Self {
            id: attempt.id,
            user: user.username.to_string(),
            quiz: attempt.activity,
            score: attempt.score.value(),
            timestamp: attempt.timestamp,
        }
    }
}

impl GameAttemptResponse {
    #[must_use]
    pub fn new(attempt: &GameAttempt, user: &User) -> Self {
        Self {
            id: attempt.id,
            user: user.username.to_string(),
            game: attempt.activity,
            score: attempt.score.value(),
            timestamp: attempt.timestamp,
        }
    }
}
