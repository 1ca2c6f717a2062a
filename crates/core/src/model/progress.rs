use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{AttemptId, GameId, ProgressId, QuizId, TopicId, UserId};

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ScoreError {
    #[error("score must be a finite number")]
    NotFinite,

    #[error("score must be between 0 and 100, got {0}")]
    OutOfRange(f64),
}

/// Percentage score of a quiz or game attempt, in `0.0..=100.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub const MAX: f64 = 100.0;

    /// # Errors
    ///
    /// Returns `ScoreError` for NaN, infinities, and values outside 0..=100.
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() {
            return Err(ScoreError::NotFinite);
        }
        if !(0.0..=Self::MAX).contains(&value) {
            return Err(ScoreError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Completion flag of one topic for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProgress {
    pub id: ProgressId,
    pub user: UserId,
    pub topic: TopicId,
    pub completed: bool,
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

/// Latest scored submission of a user for one activity.
///
/// There is at most one attempt per `(user, activity)`; resubmitting replaces
/// the score and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt<A> {
    pub id: AttemptId,
    pub user: UserId,
    pub activity: A,
    pub score: Score,
    pub timestamp: DateTime<Utc>,
}

pub type QuizAttempt = Attempt<QuizId>;
pub type GameAttempt = Attempt<GameId>;

/// An upserted row plus whether the upsert inserted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub value: T,
    pub created: bool,
}

impl<T> Upserted<T> {
    #[must_use]
    pub fn created(value: T) -> Self {
        Self {
            value,
            created: true,
        }
    }

    #[must_use]
    pub fn updated(value: T) -> Self {
        Self {
            value,
            created: false,
        }
    }
}
