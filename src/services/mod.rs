//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;
pub mod readers;

use crate::{
    config::{AuthConfig, PoliciesConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub readers: readers::ReadersService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, policies: PoliciesConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone(), policies.clone()),
            readers: readers::ReadersService::new(repository.clone(), policies),
            loans: loans::LoansService::new(repository),
        }
    }
}
