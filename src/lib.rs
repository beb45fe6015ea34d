//! shop_ledger Library
//!
//! Multi-tenant shop inventory and ledger service. Re-exports modules for
//! the server binary, the load tool and integration tests.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod reporting;
pub mod state;
pub mod storefront;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{Amount, AmountError, DomainError, Role, TenantContext};
pub use state::AppState;
