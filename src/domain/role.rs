//! Roles and the capabilities they grant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff role within a shop.
///
/// Closed on purpose: every access check matches exhaustively, so a new
/// role cannot be added without revisiting each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    SuperAdmin,
    Admin,
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Product CRUD within the caller's shop
    ManageCatalog,
    /// Record, list and delete ledger entries
    RecordTransactions,
    /// Dashboard and low-stock reports
    ViewReports,
    /// Shop settings and staff accounts
    ManageShop,
    /// Purchase prices and other cost data
    ViewCostData,
}

impl Role {
    pub fn allows(self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::SuperAdmin, _) => true,
            (Role::Admin, Capability::ManageCatalog | Capability::RecordTransactions) => true,
            (Role::Admin, Capability::ViewReports | Capability::ManageShop | Capability::ViewCostData) => {
                false
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SuperAdmin" => Ok(Role::SuperAdmin),
            "Admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_capabilities() {
        assert!(Role::Admin.allows(Capability::ManageCatalog));
        assert!(Role::Admin.allows(Capability::RecordTransactions));
        assert!(!Role::Admin.allows(Capability::ViewReports));
        assert!(!Role::Admin.allows(Capability::ManageShop));
        assert!(!Role::Admin.allows(Capability::ViewCostData));
    }

    #[test]
    fn test_super_admin_allows_everything() {
        for capability in [
            Capability::ManageCatalog,
            Capability::RecordTransactions,
            Capability::ViewReports,
            Capability::ManageShop,
            Capability::ViewCostData,
        ] {
            assert!(Role::SuperAdmin.allows(capability));
        }
    }

    #[test]
    fn test_role_parse_and_serde() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SuperAdmin\"");
    }
}
