use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Origin of the browser frontend in local development.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Browser origins allowed to call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            max_age_secs: 86_400,
        }
    }
}

impl CorsConfig {
    /// Parse a comma-separated origin list; blank input keeps the default.
    #[must_use]
    pub fn from_config_value(allowed_origins: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = allowed_origins {
            let origins: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !origins.is_empty() {
                config.allowed_origins = origins;
            }
        }
        config
    }

    #[must_use]
    pub fn build(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        info!(count = origins.len(), "CORS origins configured");

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(self.max_age_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_value_keeps_default_origin() {
        let config = CorsConfig::from_config_value(Some(" , "));
        assert_eq!(config.allowed_origins, [DEFAULT_ALLOWED_ORIGIN]);
        assert_eq!(
            CorsConfig::from_config_value(None).allowed_origins,
            [DEFAULT_ALLOWED_ORIGIN]
        );
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config =
            CorsConfig::from_config_value(Some("https://learn.example.com/, http://127.0.0.1:3000"));
        assert_eq!(
            config.allowed_origins,
            ["https://learn.example.com", "http://127.0.0.1:3000"]
        );
    }
}
