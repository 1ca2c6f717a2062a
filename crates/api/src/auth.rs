use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use academy_core::model::User;

use crate::context::AppState;
use crate::error::ApiError;

/// The account behind a valid `Authorization: Bearer <access>` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Some(token) = bearer_token(parts) else {
            return Err(ApiError::Unauthorized(
                "Authentication credentials were not provided.".into(),
            ));
        };
        let user = state.accounts().authenticate(token).await.map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            ApiError::from(err)
        })?;
        Ok(Self(user))
    }
}
