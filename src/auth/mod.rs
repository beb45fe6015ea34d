//! Credential verification
//!
//! Access tokens (HS256 JWT) and password hashing. The rest of the crate
//! only sees the resulting [`TenantContext`](crate::domain::TenantContext).

mod error;
mod password;
mod token;

pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{extract_bearer_token, Claims, TokenService};
