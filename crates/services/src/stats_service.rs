use std::sync::Arc;

use academy_core::CourseStats;
use academy_core::model::{CourseRow, UserId};
use storage::repository::{AttemptRepository, CatalogRepository, ProgressRepository};
use tracing::warn;

use crate::error::StatsError;

/// Per-course dashboard numbers for a user.
#[derive(Clone)]
pub struct StatsService {
    catalog: Arc<dyn CatalogRepository>,
    progress: Arc<dyn ProgressRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        progress: Arc<dyn ProgressRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            catalog,
            progress,
            attempts,
        }
    }

    /// One line per course, in course-id order, including courses the user
    /// never started.
    ///
    /// A course whose numbers cannot be read is logged and left out.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the course list itself cannot be read.
    pub async fn dashboard(&self, user: UserId) -> Result<Vec<CourseStats>, StatsError> {
        let courses = self.catalog.course_headers().await?;
        let mut stats = Vec::with_capacity(courses.len());
        for course in courses {
            match self.course_stats(user, &course).await {
                Ok(line) => stats.push(line),
                Err(err) => {
                    warn!(course_id = %course.id, %user, error = %err, "skipping course in dashboard");
                }
            }
        }
        Ok(stats)
    }

    async fn course_stats(
        &self,
        user: UserId,
        course: &CourseRow,
    ) -> Result<CourseStats, StatsError> {
        let total = self.catalog.count_topics(course.id).await?;
        let completed = self.progress.count_completed_in_course(user, course.id).await?;
        let scores = self.attempts.quiz_scores_for_course(user, course.id).await?;
        Ok(CourseStats::compute(
            course.id,
            course.title.clone(),
            total,
            completed,
            &scores,
        ))
    }
}
