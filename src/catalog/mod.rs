//! Catalog Store
//!
//! Product CRUD scoped to a shop, with role-based redaction on reads.

mod store;

pub use store::CatalogStore;
pub(crate) use store::{fetch_product, ProductRow, PRODUCT_COLUMNS};
