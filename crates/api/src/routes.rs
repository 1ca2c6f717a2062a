use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::context::AppState;
use crate::handlers::{self, accounts, catalog, progress, stats};

/// Every HTTP route of the service, with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = state.cors().build();
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/courses/", get(catalog::list_courses))
        .route("/api/courses/:id/", get(catalog::get_course))
        .route("/api/courses/:id/my-progress/", get(progress::my_progress))
        .route("/api/register/", post(accounts::register))
        .route("/api/token/", post(accounts::obtain_token))
        .route("/api/token/refresh/", post(accounts::refresh_token))
        .route("/api/submit-quiz/", post(progress::submit_quiz))
        .route("/api/submit-game/", post(progress::submit_game))
        .route("/api/topics/:id/mark-complete/", post(progress::mark_complete))
        .route("/api/dashboard-stats/", get(stats::dashboard))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
