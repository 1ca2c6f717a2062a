#![forbid(unsafe_code)]

pub mod account_service;
pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod progress_service;
pub mod stats_service;
pub mod tokens;

pub use academy_core::Clock;

pub use account_service::AccountService;
pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use error::{AccountError, AppServicesError, CatalogError, ProgressError, StatsError};
pub use progress_service::ProgressService;
pub use stats_service::StatsService;
pub use tokens::{Claims, TokenConfig, TokenPair, TokenType};
