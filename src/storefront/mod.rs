//! Public Catalog View
//!
//! Unauthenticated, read-only projection of an active shop's catalog.
//! Purchase prices never leave this module.

mod contact;
mod view;

pub use contact::{contact_link, CONTACT_MESSAGE_PREFIX};
pub use view::{PublicCatalog, PublicProduct, PublicProductDetail, PublicProductFilter, Storefront};
