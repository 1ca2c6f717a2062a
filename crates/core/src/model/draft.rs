use serde::Deserialize;
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("{0} title cannot be empty")]
    EmptyTitle(&'static str),

    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("answer text cannot be empty")]
    EmptyAnswer,

    #[error("question '{0}' has no correct answer")]
    NoCorrectAnswer(String),

    #[error("matching pair items cannot be empty")]
    EmptyPairItem,

    #[error("invalid video url: {0}")]
    InvalidVideoUrl(String),
}

fn require_title(kind: &'static str, title: &str) -> Result<(), ContentError> {
    if title.trim().is_empty() {
        return Err(ContentError::EmptyTitle(kind));
    }
    Ok(())
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Nested course content as authored, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub chapters: Vec<ChapterDraft>,
    #[serde(default)]
    pub quiz: Option<QuizDraft>,
    #[serde(default)]
    pub game: Option<GameDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChapterDraft {
    pub title: String,
    /// Position inside the course; defaults to the 1-based list position.
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub topics: Vec<TopicDraft>,
    #[serde(default)]
    pub quiz: Option<QuizDraft>,
    #[serde(default)]
    pub game: Option<GameDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicDraft {
    pub title: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub article_content: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub quiz: Option<QuizDraft>,
    #[serde(default)]
    pub game: Option<GameDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    #[serde(default)]
    pub answers: Vec<AnswerDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnswerDraft {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameDraft {
    pub title: String,
    #[serde(default)]
    pub pairs: Vec<PairDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PairDraft {
    pub item_a: String,
    pub item_b: String,
}

/// Resolve the explicit order of an item or fall back to its list position.
#[must_use]
pub fn order_or_position(order: Option<i32>, index: usize) -> i32 {
    order.unwrap_or_else(|| i32::try_from(index + 1).unwrap_or(i32::MAX))
}

impl CourseDraft {
    /// Check the whole tree before anything is written.
    ///
    /// # Errors
    ///
    /// Returns the first `ContentError` found, walking depth-first.
    pub fn validate(&self) -> Result<(), ContentError> {
        require_title("course", &self.title)?;
        for chapter in &self.chapters {
            chapter.validate()?;
        }
        validate_activities(self.quiz.as_ref(), self.game.as_ref())
    }
}

impl ChapterDraft {
    fn validate(&self) -> Result<(), ContentError> {
        require_title("chapter", &self.title)?;
        for topic in &self.topics {
            topic.validate()?;
        }
        validate_activities(self.quiz.as_ref(), self.game.as_ref())
    }
}

impl TopicDraft {
    fn validate(&self) -> Result<(), ContentError> {
        require_title("topic", &self.title)?;
        if let Some(raw) = self.video_url.as_deref() {
            let raw = raw.trim();
            if !raw.is_empty() {
                Url::parse(raw).map_err(|_| ContentError::InvalidVideoUrl(raw.to_string()))?;
            }
        }
        validate_activities(self.quiz.as_ref(), self.game.as_ref())
    }

    /// Video url with blanks treated as absent.
    #[must_use]
    pub fn normalized_video_url(&self) -> Option<String> {
        self.video_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    }
}

fn validate_activities(
    quiz: Option<&QuizDraft>,
    game: Option<&GameDraft>,
) -> Result<(), ContentError> {
    if let Some(quiz) = quiz {
        require_title("quiz", &quiz.title)?;
        for question in &quiz.questions {
            if question.text.trim().is_empty() {
                return Err(ContentError::EmptyQuestion);
            }
            if question.answers.iter().any(|a| a.text.trim().is_empty()) {
                return Err(ContentError::EmptyAnswer);
            }
            if !question.answers.is_empty() && !question.answers.iter().any(|a| a.is_correct) {
                return Err(ContentError::NoCorrectAnswer(question.text.clone()));
            }
        }
    }
    if let Some(game) = game {
        require_title("game", &game.title)?;
        if game
            .pairs
            .iter()
            .any(|p| p.item_a.trim().is_empty() || p.item_b.trim().is_empty())
        {
            return Err(ContentError::EmptyPairItem);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(json: &str) -> CourseDraft {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_draft_is_valid() {
        let d = draft(r#"{"title": "Empty course"}"#);
        assert!(d.validate().is_ok());
        assert!(d.chapters.is_empty());
    }

    #[test]
    fn rejects_blank_topic_title() {
        let d = draft(r#"{"title": "C", "chapters": [{"title": "Ch", "topics": [{"title": "  "}]}]}"#);
        assert_eq!(d.validate(), Err(ContentError::EmptyTitle("topic")));
    }

    #[test]
    fn rejects_relative_video_url() {
        let d = draft(
            r#"{"title": "C", "chapters": [{"title": "Ch", "topics": [{"title": "T", "video_url": "videos/1.mp4"}]}]}"#,
        );
        assert!(matches!(d.validate(), Err(ContentError::InvalidVideoUrl(_))));
    }

    #[test]
    fn rejects_question_without_correct_answer() {
        let d = draft(
            r#"{"title": "C", "quiz": {"title": "Q", "questions": [{"text": "Pick", "answers": [{"text": "a"}, {"text": "b"}]}]}}"#,
        );
        assert_eq!(
            d.validate(),
            Err(ContentError::NoCorrectAnswer("Pick".into()))
        );
    }

    #[test]
    fn blank_video_url_normalizes_to_none() {
        let topic = TopicDraft {
            title: "T".into(),
            video_url: Some("   ".into()),
            article_content: None,
            order: None,
            quiz: None,
            game: None,
        };
        assert!(topic.validate().is_ok());
        assert_eq!(topic.normalized_video_url(), None);
    }

    #[test]
    fn order_defaults_to_position() {
        assert_eq!(order_or_position(None, 0), 1);
        assert_eq!(order_or_position(Some(7), 0), 7);
    }
}
