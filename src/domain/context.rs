//! Tenant Context
//!
//! The verified identity of the caller. Every catalog, ledger and report
//! operation is parameterized by `shop_id` taken from here, never from
//! request input.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Capability, DomainError, Role};

/// Identity and scope for an authenticated operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    pub user_id: i64,
    pub shop_id: i64,
    pub role: Role,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl TenantContext {
    pub fn new(user_id: i64, shop_id: i64, role: Role) -> Self {
        Self {
            user_id,
            shop_id,
            role,
            correlation_id: None,
        }
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Fail with `Forbidden` unless the caller's role grants `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), DomainError> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "role {} is not allowed to perform this operation",
                self.role
            )))
        }
    }
}
