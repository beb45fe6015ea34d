//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod context;
pub mod error;
pub mod models;
pub mod role;

pub use amount::{money_from_cents, money_from_wide_cents, Amount, AmountError};
pub use context::TenantContext;
pub use error::DomainError;
pub use models::{
    EntryKind, LedgerEntry, NewProduct, Product, ProductPatch, ProductView, RecordEntry, Shop,
    ShopPatch, ShopSummary, User,
};
pub use role::{Capability, Role};
