use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};

use academy_core::model::{Course, CourseId};

use crate::context::AppState;
use crate::error::ApiError;

pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(state.catalog().list_courses().await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    id: Result<Path<CourseId>, PathRejection>,
) -> Result<Json<Course>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.catalog().get_course(id).await?))
}
