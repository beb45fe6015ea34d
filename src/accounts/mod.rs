//! Accounts
//!
//! Registration, login, and the shop/user management a SuperAdmin does
//! for their own shop.

mod service;

use serde::{Deserialize, Serialize};

use crate::domain::{Role, Shop, User};

pub use service::AccountService;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Attach to an existing shop
    #[serde(default)]
    pub shop_id: Option<i64>,
    /// Create a new shop; requires `contact_number`
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// User creation by a SuperAdmin, always into their own shop
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub shop_id: i64,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            shop_id: user.shop_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Shop details exposed to the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopProfile {
    pub id: i64,
    pub name: String,
    pub contact_number: String,
}

impl From<&Shop> for ShopProfile {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name.clone(),
            contact_number: shop.contact_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: UserSummary,
    pub shop: ShopProfile,
}
