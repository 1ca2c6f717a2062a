use std::sync::Arc;

use academy_core::model::{Course, CourseDraft, CourseId};
use storage::repository::CatalogRepository;
use tracing::info;

use crate::error::CatalogError;

/// Read access to the course tree plus content import.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Every course with its nested chapters, topics and activities.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CatalogError> {
        Ok(self.catalog.list_courses().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::CourseNotFound` for an unknown id.
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn get_course(&self, id: CourseId) -> Result<Course, CatalogError> {
        self.catalog
            .get_course(id)
            .await?
            .ok_or(CatalogError::CourseNotFound)
    }

    /// Validate a nested draft and write it in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Content` when the draft is invalid.
    /// Returns `CatalogError::Storage` if persistence fails.
    pub async fn import_course(&self, draft: &CourseDraft) -> Result<CourseId, CatalogError> {
        draft.validate()?;
        let id = self.catalog.import_course(draft).await?;
        info!(course_id = %id, title = %draft.title, "imported course");
        Ok(id)
    }
}
