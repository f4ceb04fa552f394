//! Libris Library Lending Server
//!
//! Staff-facing REST JSON API for managing a book catalog, registering
//! readers with tiered memberships, and issuing and returning books while
//! keeping copy counts and loan records consistent.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub repository: repository::Repository,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(
            repository.clone(),
            config.auth.clone(),
            config.policies.clone(),
        );
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            repository,
        }
    }
}
