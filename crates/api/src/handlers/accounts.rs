use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use academy_core::model::{Registration, User};
use services::TokenPair;

use crate::context::AppState;
use crate::dto::{AccessResponse, RefreshRequest, TokenRequest};
use crate::error::ApiError;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(form) = body?;
    let user = state.accounts().register(form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn obtain_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(request) = body?;
    let pair = state
        .accounts()
        .obtain_tokens(&request.username, &request.password)
        .await?;
    Ok(Json(pair))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessResponse>, ApiError> {
    let Json(request) = body?;
    let access = state.accounts().refresh(&request.refresh).await?;
    Ok(Json(AccessResponse { access }))
}
