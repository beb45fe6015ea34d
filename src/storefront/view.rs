//! Public catalog queries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::catalog::{fetch_product, ProductRow, PRODUCT_COLUMNS};
use crate::domain::{DomainError, Product, ShopSummary};
use crate::error::AppError;

use super::contact_link;

/// Query-string filters for the public product list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicProductFilter {
    #[serde(default)]
    pub category: Option<String>,
    /// Only `true` narrows the list; `false` and absent return everything
    #[serde(default)]
    pub in_stock: Option<bool>,
}

/// Product as shown to anonymous visitors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicProduct {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub selling_price: Decimal,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub in_stock: bool,
    pub contact_link: String,
}

impl PublicProduct {
    fn project(product: Product, contact_number: &str) -> Self {
        let contact_link = contact_link(contact_number, &product.name);
        PublicProduct {
            id: product.id,
            in_stock: product.stock > 0,
            contact_link,
            name: product.name,
            description: product.description,
            category: product.category,
            selling_price: product.selling_price,
            stock: product.stock,
            image_url: product.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicCatalog {
    pub shop: ShopSummary,
    pub products: Vec<PublicProduct>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicProductDetail {
    pub shop: ShopSummary,
    pub product: PublicProduct,
}

/// Active shop as resolved from a public URL
struct OpenShop {
    summary: ShopSummary,
    contact_number: String,
}

#[derive(Debug, Clone)]
pub struct Storefront {
    pool: SqlitePool,
}

impl Storefront {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Active shops, `{id, name}` only
    pub async fn list_public_shops(&self) -> Result<Vec<ShopSummary>, AppError> {
        let shops = sqlx::query_as::<_, ShopSummary>(
            "SELECT id, name FROM shops WHERE active = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(shops)
    }

    pub async fn list_products(
        &self,
        shop_id: i64,
        filter: PublicProductFilter,
    ) -> Result<PublicCatalog, AppError> {
        let shop = self.open_shop(shop_id).await?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = "));
        query.push_bind(shop_id);

        if let Some(category) = filter.category.as_deref().map(str::trim) {
            if !category.is_empty() {
                query.push(" AND category = ").push_bind(category.to_string());
            }
        }
        if filter.in_stock == Some(true) {
            query.push(" AND stock > 0");
        }
        query.push(" ORDER BY id");

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let products: Vec<PublicProduct> = rows
            .into_iter()
            .map(|row| PublicProduct::project(row.into(), &shop.contact_number))
            .collect();

        Ok(PublicCatalog {
            shop: shop.summary,
            count: products.len(),
            products,
        })
    }

    pub async fn get_product(
        &self,
        shop_id: i64,
        product_id: i64,
    ) -> Result<PublicProductDetail, AppError> {
        let shop = self.open_shop(shop_id).await?;

        let product = fetch_product(&self.pool, shop_id, product_id)
            .await?
            .ok_or(DomainError::not_found("Product"))?;

        Ok(PublicProductDetail {
            product: PublicProduct::project(product, &shop.contact_number),
            shop: shop.summary,
        })
    }

    /// Missing and inactive shops are both reported as not found.
    async fn open_shop(&self, shop_id: i64) -> Result<OpenShop, AppError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT id, name, contact_number FROM shops WHERE id = ?1 AND active = 1",
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        let (id, name, contact_number) = row.ok_or(DomainError::not_found("Shop"))?;
        Ok(OpenShop {
            summary: ShopSummary { id, name },
            contact_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(stock: i64) -> Product {
        Product {
            id: 3,
            name: "Huile".to_string(),
            description: None,
            category: Some("Epicerie".to_string()),
            image_url: None,
            purchase_price: dec!(60),
            selling_price: dec!(100),
            stock,
            shop_id: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_projection_strips_cost_and_sets_flags() {
        let public = PublicProduct::project(product(4), "2250700");
        assert!(public.in_stock);
        assert_eq!(public.selling_price, dec!(100));
        assert!(public.contact_link.starts_with("https://wa.me/2250700?text="));

        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("purchase_price").is_none());
        assert_eq!(json["in_stock"], true);
    }

    #[test]
    fn test_projection_out_of_stock() {
        let public = PublicProduct::project(product(0), "1");
        assert!(!public.in_stock);
    }
}
