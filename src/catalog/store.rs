//! Product persistence and validation.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use crate::domain::{
    money_from_cents, Amount, DomainError, NewProduct, Product, ProductPatch, ProductView, Role,
};
use crate::error::AppError;

/// Column list matching [`ProductRow`]
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, category, image_url, \
     purchase_price_cents, selling_price_cents, stock, shop_id, created_at";

/// Raw `products` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    pub stock: i64,
    pub shop_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            image_url: row.image_url,
            purchase_price: money_from_cents(row.purchase_price_cents),
            selling_price: money_from_cents(row.selling_price_cents),
            stock: row.stock,
            shop_id: row.shop_id,
            created_at: row.created_at,
        }
    }
}

/// Product store. Every query carries the caller's shop id; a product owned
/// by another shop is reported as not found.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All products of a shop, redacted for `role`
    pub async fn list(&self, shop_id: i64, role: Role) -> Result<Vec<ProductView>, AppError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = ?1 ORDER BY id"
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Product::from(row).view_for(role))
            .collect())
    }

    /// One product, redacted for `role`
    pub async fn get(&self, shop_id: i64, id: i64, role: Role) -> Result<ProductView, AppError> {
        Ok(self.find(shop_id, id).await?.view_for(role))
    }

    /// One product with every field
    pub async fn find(&self, shop_id: i64, id: i64) -> Result<Product, AppError> {
        fetch_product(&self.pool, shop_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product").into())
    }

    pub async fn create(&self, shop_id: i64, input: NewProduct) -> Result<Product, AppError> {
        let name = required_name(&input.name)?;
        let purchase_price = price("purchase_price", input.purchase_price)?;
        let selling_price = price("selling_price", input.selling_price)?;

        if selling_price < purchase_price {
            return Err(DomainError::validation(
                "selling_price must be greater than or equal to purchase_price",
            )
            .into());
        }
        if input.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative").into());
        }

        let id = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, category, image_url,
                purchase_price_cents, selling_price_cents, stock, shop_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(name)
        .bind(non_blank(input.description))
        .bind(non_blank(input.category))
        .bind(non_blank(input.image_url))
        .bind(purchase_price.cents())
        .bind(selling_price.cents())
        .bind(input.stock)
        .bind(shop_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!(shop_id, product_id = id, "Product created");

        self.find(shop_id, id).await
    }

    /// Apply a partial update. Only fields present in `patch` are written;
    /// the selling/purchase price relation is not re-checked here.
    pub async fn update(
        &self,
        shop_id: i64,
        id: i64,
        patch: ProductPatch,
    ) -> Result<Product, AppError> {
        if patch.is_empty() {
            return self.find(shop_id, id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");
        let mut columns = query.separated(", ");

        if let Some(name) = &patch.name {
            columns.push("name = ").push_bind_unseparated(required_name(name)?.to_string());
        }
        if let Some(description) = patch.description {
            columns.push("description = ").push_bind_unseparated(non_blank(description));
        }
        if let Some(category) = patch.category {
            columns.push("category = ").push_bind_unseparated(non_blank(category));
        }
        if let Some(image_url) = patch.image_url {
            columns.push("image_url = ").push_bind_unseparated(non_blank(image_url));
        }
        if let Some(value) = patch.purchase_price {
            columns
                .push("purchase_price_cents = ")
                .push_bind_unseparated(price("purchase_price", value)?.cents());
        }
        if let Some(value) = patch.selling_price {
            columns
                .push("selling_price_cents = ")
                .push_bind_unseparated(price("selling_price", value)?.cents());
        }
        if let Some(stock) = patch.stock {
            if stock < 0 {
                return Err(DomainError::validation("stock cannot be negative").into());
            }
            columns.push("stock = ").push_bind_unseparated(stock);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND shop_id = ")
            .push_bind(shop_id);

        let updated = query.build().execute(&self.pool).await?.rows_affected();
        if updated == 0 {
            return Err(DomainError::not_found("Product").into());
        }

        tracing::info!(shop_id, product_id = id, "Product updated");

        self.find(shop_id, id).await
    }

    /// Delete a product. Ledger entries referencing it keep the dangling id.
    pub async fn delete(&self, shop_id: i64, id: i64) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM products WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(DomainError::not_found("Product").into());
        }

        tracing::info!(shop_id, product_id = id, "Product deleted");
        Ok(())
    }

    /// Products with stock under `threshold`, lowest stock first
    pub async fn low_stock(&self, shop_id: i64, threshold: i64) -> Result<Vec<Product>, AppError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE shop_id = ?1 AND stock < ?2 ORDER BY stock ASC, id ASC"
        ))
        .bind(shop_id)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

/// Shop-scoped product lookup usable inside or outside a transaction
pub(crate) async fn fetch_product<'e, E>(
    executor: E,
    shop_id: i64,
    id: i64,
) -> Result<Option<Product>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<ProductRow> = sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND shop_id = ?2"
    ))
    .bind(id)
    .bind(shop_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Product::from))
}

fn required_name(name: &str) -> Result<&str, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name is required"));
    }
    Ok(name)
}

fn price(field: &str, value: rust_decimal::Decimal) -> Result<Amount, DomainError> {
    Amount::new(value).map_err(|e| DomainError::validation(format!("{}: {}", field, e)))
}

/// Blank optional text is stored as NULL
fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
