//! Entity models
//!
//! Shop, User, Product and LedgerEntry as the rest of the crate sees them.
//! Money is `Decimal` here; the stores translate to and from cents.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Amount, Capability, Role};

// =========================================================================
// Shop
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub contact_number: String,
    pub created_at: DateTime<Utc>,
}

/// Shop summary safe for unauthenticated callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShopSummary {
    pub id: i64,
    pub name: String,
}

impl From<&Shop> for ShopSummary {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name.clone(),
        }
    }
}

/// Partial shop update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

// =========================================================================
// User
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub shop_id: i64,
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// Product
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub stock: i64,
    pub shop_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Role-dependent representation of a product.
///
/// `purchase_price` is omitted from the serialized form unless the role
/// may see cost data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Decimal>,
    pub selling_price: Decimal,
    pub stock: i64,
    pub shop_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn view_for(&self, role: Role) -> ProductView {
        let purchase_price = role
            .allows(Capability::ViewCostData)
            .then_some(self.purchase_price);

        ProductView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            image_url: self.image_url.clone(),
            purchase_price,
            selling_price: self.selling_price,
            stock: self.stock,
            shop_id: self.shop_id,
            created_at: self.created_at,
        }
    }
}

/// Input for product creation. Prices are validated by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    #[serde(default)]
    pub stock: i64,
}

/// Partial product update.
///
/// `None` means "leave unchanged". For the nullable text fields,
/// `Some(None)` (JSON `null`) clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub purchase_price: Option<Decimal>,
    #[serde(default)]
    pub selling_price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.purchase_price.is_none()
            && self.selling_price.is_none()
            && self.stock.is_none()
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =========================================================================
// Ledger
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum EntryKind {
    Sale,
    Expense,
    Withdrawal,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Sale => "Sale",
            EntryKind::Expense => "Expense",
            EntryKind::Withdrawal => "Withdrawal",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sale" => Ok(EntryKind::Sale),
            "Expense" => Ok(EntryKind::Expense),
            "Withdrawal" => Ok(EntryKind::Withdrawal),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// An immutable record of money moving in or out of a shop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub kind: EntryKind,
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub amount: Decimal,
    pub shop_id: i64,
    pub created_at: DateTime<Utc>,
    /// Referenced product, when it still exists
    pub product: Option<Product>,
}

/// A validated ledger write request.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEntry {
    Sale { product_id: i64, quantity: i64 },
    Expense { amount: Amount },
    Withdrawal { amount: Amount },
}

impl RecordEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            RecordEntry::Sale { .. } => EntryKind::Sale,
            RecordEntry::Expense { .. } => EntryKind::Expense,
            RecordEntry::Withdrawal { .. } => EntryKind::Withdrawal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_product() -> Product {
        Product {
            id: 1,
            name: "Phone charger".to_string(),
            description: None,
            category: Some("Accessories".to_string()),
            image_url: None,
            purchase_price: dec!(60),
            selling_price: dec!(100),
            stock: 10,
            shop_id: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_view_omits_purchase_price() {
        let view = sample_product().view_for(Role::Admin);
        assert!(view.purchase_price.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("purchase_price").is_none());
        assert!(json.get("selling_price").is_some());
    }

    #[test]
    fn test_super_admin_view_keeps_purchase_price() {
        let view = sample_product().view_for(Role::SuperAdmin);
        assert_eq!(view.purchase_price, Some(dec!(60)));

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("purchase_price").is_some());
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let patch: ProductPatch =
            serde_json::from_str(r#"{"description": null, "stock": 0}"#).unwrap();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.category, None);
        assert_eq!(patch.stock, Some(0));
        assert!(!patch.is_empty());

        let empty: ProductPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_entry_kind_parse() {
        assert_eq!("Sale".parse::<EntryKind>(), Ok(EntryKind::Sale));
        assert!("Refund".parse::<EntryKind>().is_err());
    }
}
