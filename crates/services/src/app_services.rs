use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::account_service::AccountService;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::stats_service::StatsService;
use crate::tokens::TokenConfig;

/// Assembles the services shared by every request handler.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    accounts: Arc<AccountService>,
    progress: Arc<ProgressService>,
    stats: Arc<StatsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, migrating it first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        tokens: TokenConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, tokens))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, tokens: TokenConfig) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, tokens)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, tokens: TokenConfig) -> Self {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.catalog)));
        let accounts = Arc::new(AccountService::new(
            clock,
            Arc::clone(&storage.users),
            tokens,
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.attempts),
        ));
        let stats = Arc::new(StatsService::new(
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.attempts),
        ));

        Self {
            catalog,
            accounts,
            progress,
            stats,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }
}
