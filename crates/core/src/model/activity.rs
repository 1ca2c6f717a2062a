use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{
    AnswerId, ChapterId, CourseId, GameId, PairId, QuestionId, QuizId, TopicId,
};

//
// ─── SCOPE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("unknown activity scope kind: {0}")]
    UnknownKind(String),
}

/// The single content node a quiz or matching game is attached to.
///
/// A quiz belongs to exactly one course, chapter or topic. Encoding that as an
/// enum makes "no parent" and "two parents" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActivityScope {
    Course(CourseId),
    Chapter(ChapterId),
    Topic(TopicId),
}

impl ActivityScope {
    /// Storage tag for the scope kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ActivityScope::Course(_) => "course",
            ActivityScope::Chapter(_) => "chapter",
            ActivityScope::Topic(_) => "topic",
        }
    }

    /// Raw id of the node the activity is attached to.
    #[must_use]
    pub fn target_id(&self) -> u64 {
        match self {
            ActivityScope::Course(id) => id.value(),
            ActivityScope::Chapter(id) => id.value(),
            ActivityScope::Topic(id) => id.value(),
        }
    }

    /// Rebuild a scope from its `(kind, id)` storage pair.
    ///
    /// # Errors
    ///
    /// Returns `ScopeError::UnknownKind` for tags other than
    /// `course`, `chapter` and `topic`.
    pub fn from_parts(kind: &str, id: u64) -> Result<Self, ScopeError> {
        match kind {
            "course" => Ok(ActivityScope::Course(CourseId::new(id))),
            "chapter" => Ok(ActivityScope::Chapter(ChapterId::new(id))),
            "topic" => Ok(ActivityScope::Topic(TopicId::new(id))),
            other => Err(ScopeError::UnknownKind(other.to_string())),
        }
    }

    /// The topic to mark complete when the activity is finished, if any.
    #[must_use]
    pub fn topic(&self) -> Option<TopicId> {
        match self {
            ActivityScope::Topic(id) => Some(*id),
            _ => None,
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub id: AnswerId,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    #[serde(skip)]
    pub scope: ActivityScope,
    pub questions: Vec<Question>,
}

//
// ─── MATCHING GAME ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchingPair {
    pub id: PairId,
    pub item_a: String,
    pub item_b: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchingGame {
    pub id: GameId,
    pub title: String,
    #[serde(skip)]
    pub scope: ActivityScope,
    pub pairs: Vec<MatchingPair>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_round_trips_through_storage_parts() {
        let scopes = [
            ActivityScope::Course(CourseId::new(1)),
            ActivityScope::Chapter(ChapterId::new(2)),
            ActivityScope::Topic(TopicId::new(3)),
        ];
        for scope in scopes {
            let rebuilt = ActivityScope::from_parts(scope.kind(), scope.target_id()).unwrap();
            assert_eq!(rebuilt, scope);
        }
    }

    #[test]
    fn unknown_scope_kind_is_rejected() {
        let err = ActivityScope::from_parts("lesson", 4).unwrap_err();
        assert_eq!(err, ScopeError::UnknownKind("lesson".into()));
    }

    #[test]
    fn only_topic_scopes_complete_a_topic() {
        assert_eq!(
            ActivityScope::Topic(TopicId::new(8)).topic(),
            Some(TopicId::new(8))
        );
        assert_eq!(ActivityScope::Chapter(ChapterId::new(8)).topic(), None);
        assert_eq!(ActivityScope::Course(CourseId::new(8)).topic(), None);
    }

    #[test]
    fn quiz_json_hides_scope() {
        let quiz = Quiz {
            id: QuizId::new(5),
            title: "Basics".into(),
            scope: ActivityScope::Topic(TopicId::new(1)),
            questions: vec![Question {
                id: QuestionId::new(1),
                text: "2 + 2?".into(),
                answers: vec![Answer {
                    id: AnswerId::new(1),
                    text: "4".into(),
                    is_correct: true,
                }],
            }],
        };
        let json = serde_json::to_value(&quiz).unwrap();
        assert!(json.get("scope").is_none());
        assert_eq!(json["questions"][0]["answers"][0]["is_correct"], true);
    }
}
