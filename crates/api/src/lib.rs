#![forbid(unsafe_code)]

pub mod auth;
pub mod context;
pub mod cors;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use auth::CurrentUser;
pub use context::AppState;
pub use cors::CorsConfig;
pub use error::ApiError;
pub use routes::router;
