use axum::Json;
use axum::extract::State;

use academy_core::CourseStats;

use crate::auth::CurrentUser;
use crate::context::AppState;
use crate::error::ApiError;

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CourseStats>>, ApiError> {
    Ok(Json(state.stats().dashboard(user.id).await?))
}
