//! Per-course progress aggregation.
//!
//! Storage supplies raw counts and the score list; everything that turns them
//! into dashboard numbers lives here so both storage backends agree.

use serde::Serialize;

use crate::model::CourseId;

/// Dashboard line for one course and one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseStats {
    pub course_id: CourseId,
    pub course_title: String,
    pub total_topics: u64,
    pub completed_topics: u64,
    pub completion_percentage: f64,
    pub average_quiz_score: Option<f64>,
}

impl CourseStats {
    /// Build the dashboard line from raw course numbers.
    ///
    /// `quiz_scores` holds one entry per attempt reachable from the course,
    /// whatever level (course, chapter or topic) its quiz is attached to.
    #[must_use]
    pub fn compute(
        course_id: CourseId,
        course_title: impl Into<String>,
        total_topics: u64,
        completed_topics: u64,
        quiz_scores: &[f64],
    ) -> Self {
        Self {
            course_id,
            course_title: course_title.into(),
            total_topics,
            completed_topics,
            completion_percentage: round2(completion_percentage(completed_topics, total_topics)),
            average_quiz_score: average(quiz_scores).map(round2),
        }
    }
}

/// `completed / total * 100`, or `0` for a course without topics.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round half away from zero to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_the_topics_is_fifty_percent() {
        let stats = CourseStats::compute(CourseId::new(1), "Rust", 4, 2, &[]);
        assert_eq!(stats.completion_percentage, 50.0);
        assert_eq!(stats.average_quiz_score, None);
    }

    #[test]
    fn empty_course_is_zero_percent() {
        assert_eq!(completion_percentage(0, 0), 0.0);
        let stats = CourseStats::compute(CourseId::new(1), "Empty", 0, 0, &[80.0]);
        assert_eq!(stats.completion_percentage, 0.0);
        assert_eq!(stats.average_quiz_score, Some(80.0));
    }

    #[test]
    fn all_topics_is_one_hundred_percent() {
        assert_eq!(completion_percentage(7, 7), 100.0);
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        let stats = CourseStats::compute(CourseId::new(1), "Thirds", 3, 1, &[]);
        assert_eq!(stats.completion_percentage, 33.33);
    }

    #[test]
    fn average_is_arithmetic_mean() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[90.0]), Some(90.0));
        assert_eq!(average(&[100.0, 50.0, 60.0]), Some(70.0));
        let stats = CourseStats::compute(CourseId::new(1), "C", 1, 0, &[100.0, 0.0, 33.0]);
        assert_eq!(stats.average_quiz_score, Some(44.33));
    }

    #[test]
    fn serializes_null_average() {
        let stats = CourseStats::compute(CourseId::new(3), "C", 2, 1, &[]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["course_id"], 3);
        assert_eq!(json["completion_percentage"], 50.0);
        assert!(json["average_quiz_score"].is_null());
    }
}
