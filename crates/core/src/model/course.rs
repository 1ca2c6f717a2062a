use std::collections::HashMap;

use serde::Serialize;

use crate::model::activity::{
    ActivityScope, Answer, MatchingGame, MatchingPair, Question, Quiz,
};
use crate::model::ids::{
    AnswerId, ChapterId, CourseId, GameId, PairId, QuestionId, QuizId, TopicId,
};

//
// ─── COURSE TREE ───────────────────────────────────────────────────────────────
//

/// Leaf content unit with optional topic-level activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: TopicId,
    #[serde(skip)]
    pub chapter_id: ChapterId,
    pub title: String,
    pub video_url: Option<String>,
    pub article_content: Option<String>,
    pub order: i32,
    pub topic_quiz: Option<Quiz>,
    pub matching_game: Option<MatchingGame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(skip)]
    pub course_id: CourseId,
    pub title: String,
    pub order: i32,
    pub topics: Vec<Topic>,
    pub chapter_quiz: Option<Quiz>,
    pub matching_game: Option<MatchingGame>,
}

/// A course with its full nested content, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub chapters: Vec<Chapter>,
    pub course_quiz: Option<Quiz>,
    pub matching_game: Option<MatchingGame>,
}

impl Course {
    /// Number of topics across all chapters.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.chapters.iter().map(|c| c.topics.len()).sum()
    }
}

//
// ─── FLAT ROWS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRow {
    pub id: CourseId,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRow {
    pub id: ChapterId,
    pub course_id: CourseId,
    pub title: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRow {
    pub id: TopicId,
    pub chapter_id: ChapterId,
    pub title: String,
    pub video_url: Option<String>,
    pub article_content: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRow {
    pub id: QuizId,
    pub title: String,
    pub scope: ActivityScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRow {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRow {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRow {
    pub id: GameId,
    pub title: String,
    pub scope: ActivityScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRow {
    pub id: PairId,
    pub game_id: GameId,
    pub item_a: String,
    pub item_b: String,
}

/// Every row needed to build one or more course trees.
///
/// Storage adapters fill this with whatever they fetched; rows that do not
/// belong to any of `courses` are ignored by [`CatalogRows::assemble`].
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    pub courses: Vec<CourseRow>,
    pub chapters: Vec<ChapterRow>,
    pub topics: Vec<TopicRow>,
    pub quizzes: Vec<QuizRow>,
    pub questions: Vec<QuestionRow>,
    pub answers: Vec<AnswerRow>,
    pub games: Vec<GameRow>,
    pub pairs: Vec<PairRow>,
}

impl CatalogRows {
    /// Build nested course trees.
    ///
    /// Courses keep the order they were given in. Chapters and topics are
    /// sorted by `order`, then id; questions, answers and pairs by id.
    #[must_use]
    pub fn assemble(self) -> Vec<Course> {
        let CatalogRows {
            courses,
            mut chapters,
            mut topics,
            quizzes,
            mut questions,
            mut answers,
            games,
            mut pairs,
        } = self;

        answers.sort_by_key(|a| a.id);
        let mut answers_by_question: HashMap<QuestionId, Vec<Answer>> = HashMap::new();
        for a in answers {
            answers_by_question.entry(a.question_id).or_default().push(Answer {
                id: a.id,
                text: a.text,
                is_correct: a.is_correct,
            });
        }

        questions.sort_by_key(|q| q.id);
        let mut questions_by_quiz: HashMap<QuizId, Vec<Question>> = HashMap::new();
        for q in questions {
            let answers = answers_by_question.remove(&q.id).unwrap_or_default();
            questions_by_quiz.entry(q.quiz_id).or_default().push(Question {
                id: q.id,
                text: q.text,
                answers,
            });
        }

        let mut quiz_by_scope: HashMap<ActivityScope, Quiz> = HashMap::new();
        for q in quizzes {
            let questions = questions_by_quiz.remove(&q.id).unwrap_or_default();
            quiz_by_scope.insert(
                q.scope,
                Quiz {
                    id: q.id,
                    title: q.title,
                    scope: q.scope,
                    questions,
                },
            );
        }

        pairs.sort_by_key(|p| p.id);
        let mut pairs_by_game: HashMap<GameId, Vec<MatchingPair>> = HashMap::new();
        for p in pairs {
            pairs_by_game.entry(p.game_id).or_default().push(MatchingPair {
                id: p.id,
                item_a: p.item_a,
                item_b: p.item_b,
            });
        }

        let mut game_by_scope: HashMap<ActivityScope, MatchingGame> = HashMap::new();
        for g in games {
            let pairs = pairs_by_game.remove(&g.id).unwrap_or_default();
            game_by_scope.insert(
                g.scope,
                MatchingGame {
                    id: g.id,
                    title: g.title,
                    scope: g.scope,
                    pairs,
                },
            );
        }

        topics.sort_by_key(|t| (t.order, t.id));
        let mut topics_by_chapter: HashMap<ChapterId, Vec<Topic>> = HashMap::new();
        for t in topics {
            let scope = ActivityScope::Topic(t.id);
            topics_by_chapter.entry(t.chapter_id).or_default().push(Topic {
                id: t.id,
                chapter_id: t.chapter_id,
                title: t.title,
                video_url: t.video_url,
                article_content: t.article_content,
                order: t.order,
                topic_quiz: quiz_by_scope.remove(&scope),
                matching_game: game_by_scope.remove(&scope),
            });
        }

        chapters.sort_by_key(|c| (c.order, c.id));
        let mut chapters_by_course: HashMap<CourseId, Vec<Chapter>> = HashMap::new();
        for c in chapters {
            let scope = ActivityScope::Chapter(c.id);
            chapters_by_course.entry(c.course_id).or_default().push(Chapter {
                id: c.id,
                course_id: c.course_id,
                title: c.title,
                order: c.order,
                topics: topics_by_chapter.remove(&c.id).unwrap_or_default(),
                chapter_quiz: quiz_by_scope.remove(&scope),
                matching_game: game_by_scope.remove(&scope),
            });
        }

        courses
            .into_iter()
            .map(|c| {
                let scope = ActivityScope::Course(c.id);
                Course {
                    id: c.id,
                    title: c.title,
                    description: c.description,
                    chapters: chapters_by_course.remove(&c.id).unwrap_or_default(),
                    course_quiz: quiz_by_scope.remove(&scope),
                    matching_game: game_by_scope.remove(&scope),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> CatalogRows {
        CatalogRows {
            courses: vec![CourseRow {
                id: CourseId::new(1),
                title: "Rust".into(),
                description: "Systems programming".into(),
            }],
            chapters: vec![
                ChapterRow {
                    id: ChapterId::new(20),
                    course_id: CourseId::new(1),
                    title: "Ownership".into(),
                    order: 2,
                },
                ChapterRow {
                    id: ChapterId::new(10),
                    course_id: CourseId::new(1),
                    title: "Basics".into(),
                    order: 1,
                },
            ],
            topics: vec![
                TopicRow {
                    id: TopicId::new(101),
                    chapter_id: ChapterId::new(10),
                    title: "Variables".into(),
                    video_url: None,
                    article_content: Some("let x = 1;".into()),
                    order: 2,
                },
                TopicRow {
                    id: TopicId::new(100),
                    chapter_id: ChapterId::new(10),
                    title: "Hello".into(),
                    video_url: Some("https://example.com/v.mp4".into()),
                    article_content: None,
                    order: 1,
                },
            ],
            quizzes: vec![
                QuizRow {
                    id: QuizId::new(1),
                    title: "Hello quiz".into(),
                    scope: ActivityScope::Topic(TopicId::new(100)),
                },
                QuizRow {
                    id: QuizId::new(2),
                    title: "Final".into(),
                    scope: ActivityScope::Course(CourseId::new(1)),
                },
            ],
            questions: vec![QuestionRow {
                id: QuestionId::new(1),
                quiz_id: QuizId::new(1),
                text: "Which macro prints?".into(),
            }],
            answers: vec![
                AnswerRow {
                    id: AnswerId::new(2),
                    question_id: QuestionId::new(1),
                    text: "dbg!".into(),
                    is_correct: false,
                },
                AnswerRow {
                    id: AnswerId::new(1),
                    question_id: QuestionId::new(1),
                    text: "println!".into(),
                    is_correct: true,
                },
            ],
            games: vec![GameRow {
                id: GameId::new(1),
                title: "Match keywords".into(),
                scope: ActivityScope::Chapter(ChapterId::new(20)),
            }],
            pairs: vec![PairRow {
                id: PairId::new(1),
                game_id: GameId::new(1),
                item_a: "move".into(),
                item_b: "transfer ownership".into(),
            }],
        }
    }

    #[test]
    fn assemble_orders_chapters_and_topics() {
        let courses = rows().assemble();
        assert_eq!(courses.len(), 1);
        let course = &courses[0];
        let chapter_titles: Vec<_> = course.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(chapter_titles, ["Basics", "Ownership"]);
        let topic_ids: Vec<_> = course.chapters[0].topics.iter().map(|t| t.id).collect();
        assert_eq!(topic_ids, [TopicId::new(100), TopicId::new(101)]);
        assert_eq!(course.topic_count(), 2);
    }

    #[test]
    fn assemble_attaches_activities_to_their_scope() {
        let course = rows().assemble().remove(0);
        let hello = &course.chapters[0].topics[0];
        let quiz = hello.topic_quiz.as_ref().unwrap();
        assert_eq!(quiz.id, QuizId::new(1));
        assert_eq!(quiz.questions[0].answers[0].text, "println!");
        assert!(course.chapters[0].topics[1].topic_quiz.is_none());

        assert_eq!(course.course_quiz.as_ref().unwrap().title, "Final");
        assert!(course.chapters[0].matching_game.is_none());
        let game = course.chapters[1].matching_game.as_ref().unwrap();
        assert_eq!(game.pairs[0].item_a, "move");
    }

    #[test]
    fn assemble_skips_orphaned_rows() {
        let mut rows = rows();
        rows.courses.clear();
        assert!(rows.assemble().is_empty());
    }
}
