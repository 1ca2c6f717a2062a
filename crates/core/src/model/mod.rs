mod activity;
mod course;
pub mod draft;
mod ids;
mod progress;
mod user;

pub use activity::{ActivityScope, Answer, MatchingGame, MatchingPair, Question, Quiz, ScopeError};
pub use course::{
    AnswerRow, CatalogRows, Chapter, ChapterRow, Course, CourseRow, GameRow, PairRow, QuestionRow,
    QuizRow, Topic, TopicRow,
};
pub use draft::{ContentError, CourseDraft};
pub use ids::{
    AnswerId, AttemptId, ChapterId, CourseId, GameId, PairId, ParseIdError, ProgressId,
    QuestionId, QuizId, TopicId, UserId,
};
pub use progress::{
    Attempt, GameAttempt, QuizAttempt, Score, ScoreError, Upserted, UserProgress,
};
pub use user::{
    PASSWORD_MIN_LEN, Registration, USERNAME_MAX_LEN, User, UserValidationError, Username,
    ValidRegistration,
};
