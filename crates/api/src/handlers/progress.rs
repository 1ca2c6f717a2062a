use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;

use academy_core::model::{CourseId, TopicId, UserProgress};

use crate::auth::CurrentUser;
use crate::context::AppState;
use crate::dto::{GameAttemptResponse, QuizAttemptResponse, SubmitGameRequest, SubmitQuizRequest};
use crate::error::ApiError;

fn upsert_status(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

pub async fn submit_quiz(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QuizAttemptResponse>), ApiError> {
    let Json(request) = body?;
    let saved = state
        .progress()
        .submit_quiz_score(user.id, request.quiz_id, request.score)
        .await?;
    Ok((
        upsert_status(saved.created),
        Json(QuizAttemptResponse::new(&saved.value, &user)),
    ))
}

pub async fn submit_game(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<SubmitGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GameAttemptResponse>), ApiError> {
    let Json(request) = body?;
    let saved = state
        .progress()
        .submit_game_score(user.id, request.game_id, request.score)
        .await?;
    Ok((
        upsert_status(saved.created),
        Json(GameAttemptResponse::new(&saved.value, &user)),
    ))
}

pub async fn mark_complete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    topic: Result<Path<TopicId>, PathRejection>,
) -> Result<Json<UserProgress>, ApiError> {
    let Path(topic) = topic?;
    Ok(Json(state.progress().mark_topic_complete(user.id, topic).await?))
}

pub async fn my_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    course: Result<Path<CourseId>, PathRejection>,
) -> Result<Json<Vec<UserProgress>>, ApiError> {
    let Path(course) = course?;
    Ok(Json(state.progress().course_progress(user.id, course).await?))
}
