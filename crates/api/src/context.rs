use std::sync::Arc;

use services::{AccountService, AppServices, CatalogService, ProgressService, StatsService};

use crate::cors::CorsConfig;

/// Router state: the services every handler draws from.
#[derive(Clone)]
pub struct AppState {
    services: AppServices,
    cors: CorsConfig,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            cors: CorsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    #[must_use]
    pub fn cors(&self) -> &CorsConfig {
        &self.cors
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        self.services.catalog()
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        self.services.accounts()
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        self.services.progress()
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        self.services.stats()
    }
}
