//! Shared application state
//!
//! Built once at startup and handed to the router; nothing is reached
//! through globals.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::accounts::AccountService;
use crate::auth::TokenService;
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::ledger::LedgerEngine;
use crate::reporting::ReportingService;
use crate::storefront::Storefront;

#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiration_hours);
        Self {
            pool,
            config: Arc::new(config),
            tokens,
        }
    }

    pub fn catalog(&self) -> CatalogStore {
        CatalogStore::new(self.pool.clone())
    }

    pub fn ledger(&self) -> LedgerEngine {
        LedgerEngine::new(self.pool.clone())
    }

    pub fn reporting(&self) -> ReportingService {
        ReportingService::new(self.pool.clone())
    }

    pub fn storefront(&self) -> Storefront {
        Storefront::new(self.pool.clone())
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.pool.clone(), self.tokens.clone())
    }
}
