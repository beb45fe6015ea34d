//! Ledger persistence and the stock adjustment protocol.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::catalog::{ProductRow, PRODUCT_COLUMNS};
use crate::domain::{
    money_from_cents, Amount, DomainError, EntryKind, LedgerEntry, Product, RecordEntry,
};
use crate::error::AppError;

const ENTRY_COLUMNS: &str = "id, kind, product_id, quantity, amount_cents, shop_id, created_at";

/// Raw `ledger_entries` row
#[derive(Debug, Clone, sqlx::FromRow)]
struct EntryRow {
    id: i64,
    kind: EntryKind,
    product_id: Option<i64>,
    quantity: i64,
    amount_cents: i64,
    shop_id: i64,
    created_at: DateTime<Utc>,
}

impl EntryRow {
    fn into_entry(self, product: Option<Product>) -> LedgerEntry {
        LedgerEntry {
            id: self.id,
            kind: self.kind,
            product_id: self.product_id,
            quantity: self.quantity,
            amount: money_from_cents(self.amount_cents),
            shop_id: self.shop_id,
            created_at: self.created_at,
            product,
        }
    }
}

/// Outcome of a ledger write
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEntry {
    pub entry: LedgerEntry,
    /// Product stock after a sale; `None` for expenses and withdrawals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_stock: Option<i64>,
}

/// Outcome of a ledger deletion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedEntry {
    pub id: i64,
    pub kind: EntryKind,
    /// Product stock after the reversal, when one happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_stock: Option<i64>,
}

/// Ledger engine scoped per call by shop id
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    pool: SqlitePool,
}

impl LedgerEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record any kind of entry
    pub async fn record(&self, shop_id: i64, request: RecordEntry) -> Result<RecordedEntry, AppError> {
        match request {
            RecordEntry::Sale {
                product_id,
                quantity,
            } => self.record_sale(shop_id, product_id, quantity).await,
            RecordEntry::Expense { amount } => Ok(RecordedEntry {
                entry: self.record_expense(shop_id, amount).await?,
                new_stock: None,
            }),
            RecordEntry::Withdrawal { amount } => Ok(RecordedEntry {
                entry: self.record_withdrawal(shop_id, amount).await?,
                new_stock: None,
            }),
        }
    }

    /// Sell `quantity` units of a product.
    ///
    /// The stock check happens inside the transaction as a conditional
    /// decrement, so two concurrent sales cannot both pass a stale check.
    /// Any failure before commit drops the transaction and rolls back.
    pub async fn record_sale(
        &self,
        shop_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<RecordedEntry, AppError> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be greater than zero").into());
        }

        let mut tx = self.pool.begin().await?;

        let decremented: Option<(i64, i64)> = sqlx::query_as(
            r#"
            UPDATE products
            SET stock = stock - ?1
            WHERE id = ?2 AND shop_id = ?3 AND stock >= ?1
            RETURNING stock, selling_price_cents
            "#,
        )
        .bind(quantity)
        .bind(product_id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (new_stock, unit_price_cents) = match decremented {
            Some(row) => row,
            None => {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1 AND shop_id = ?2")
                        .bind(product_id)
                        .bind(shop_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(match available {
                    None => DomainError::not_found("Product"),
                    Some(available) => DomainError::insufficient_stock(available, quantity),
                }
                .into());
            }
        };

        let total = Amount::from_cents(unit_price_cents)?.times(quantity)?;

        let entry_id = sqlx::query(
            r#"
            INSERT INTO ledger_entries (kind, product_id, quantity, amount_cents, shop_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(EntryKind::Sale)
        .bind(product_id)
        .bind(quantity)
        .bind(total.cents())
        .bind(shop_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        tracing::info!(
            shop_id,
            entry_id,
            product_id,
            quantity,
            amount = %total,
            new_stock,
            "Sale recorded"
        );

        Ok(RecordedEntry {
            entry: self.get(shop_id, entry_id).await?,
            new_stock: Some(new_stock),
        })
    }

    pub async fn record_expense(&self, shop_id: i64, amount: Amount) -> Result<LedgerEntry, AppError> {
        self.insert_cash_movement(shop_id, EntryKind::Expense, amount).await
    }

    pub async fn record_withdrawal(
        &self,
        shop_id: i64,
        amount: Amount,
    ) -> Result<LedgerEntry, AppError> {
        self.insert_cash_movement(shop_id, EntryKind::Withdrawal, amount).await
    }

    /// Single-row insert for entries that do not touch stock
    async fn insert_cash_movement(
        &self,
        shop_id: i64,
        kind: EntryKind,
        amount: Amount,
    ) -> Result<LedgerEntry, AppError> {
        let entry_id = sqlx::query(
            r#"
            INSERT INTO ledger_entries (kind, product_id, quantity, amount_cents, shop_id, created_at)
            VALUES (?1, NULL, 0, ?2, ?3, ?4)
            "#,
        )
        .bind(kind)
        .bind(amount.cents())
        .bind(shop_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!(shop_id, entry_id, kind = %kind, amount = %amount, "Ledger entry recorded");

        self.get(shop_id, entry_id).await
    }

    /// One entry with its product resolved
    pub async fn get(&self, shop_id: i64, id: i64) -> Result<LedgerEntry, AppError> {
        let row: EntryRow = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?1 AND shop_id = ?2"
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DomainError::not_found("Transaction"))?;

        let mut entries = self.resolve_products(shop_id, vec![row]).await?;
        entries
            .pop()
            .ok_or_else(|| AppError::Internal("resolved entry vanished".to_string()))
    }

    /// Entries newest-first, optionally of a single kind
    pub async fn list(
        &self,
        shop_id: i64,
        kind: Option<EntryKind>,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE shop_id = "));
        query.push_bind(shop_id);

        if let Some(kind) = kind {
            query.push(" AND kind = ").push_bind(kind);
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<EntryRow> = query.build_query_as().fetch_all(&self.pool).await?;

        self.resolve_products(shop_id, rows).await
    }

    /// Delete an entry, reversing a sale's stock effect.
    ///
    /// Reversal and removal share one transaction. If the sold product has
    /// since been deleted the reversal is skipped with a warning and the
    /// entry is still removed.
    pub async fn delete(&self, shop_id: i64, id: i64) -> Result<DeletedEntry, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<(EntryKind, Option<i64>, i64)> = sqlx::query_as(
            r#"
            DELETE FROM ledger_entries
            WHERE id = ?1 AND shop_id = ?2
            RETURNING kind, product_id, quantity
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (kind, product_id, quantity) =
            removed.ok_or_else(|| DomainError::not_found("Transaction"))?;

        let mut restored_stock: Option<i64> = None;
        if let (EntryKind::Sale, Some(product_id)) = (kind, product_id) {
            restored_stock = sqlx::query_scalar(
                r#"
                UPDATE products
                SET stock = stock + ?1
                WHERE id = ?2 AND shop_id = ?3
                RETURNING stock
                "#,
            )
            .bind(quantity)
            .bind(product_id)
            .bind(shop_id)
            .fetch_optional(&mut *tx)
            .await?;

            if restored_stock.is_none() {
                tracing::warn!(
                    shop_id,
                    entry_id = id,
                    product_id,
                    quantity,
                    "Sold product no longer exists, skipping stock reversal"
                );
            }
        }

        tx.commit().await?;

        tracing::info!(shop_id, entry_id = id, kind = %kind, ?restored_stock, "Ledger entry deleted");

        Ok(DeletedEntry {
            id,
            kind,
            restored_stock,
        })
    }

    /// Attach each entry's product (same shop), fetching them in one query
    async fn resolve_products(
        &self,
        shop_id: i64,
        rows: Vec<EntryRow>,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let ids: BTreeSet<i64> = rows.iter().filter_map(|row| row.product_id).collect();

        let mut products: HashMap<i64, Product> = HashMap::new();
        if !ids.is_empty() {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = "
            ));
            query.push_bind(shop_id).push(" AND id IN (");
            let mut separated = query.separated(", ");
            for id in &ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let found: Vec<ProductRow> = query.build_query_as().fetch_all(&self.pool).await?;
            products.extend(found.into_iter().map(|row| (row.id, Product::from(row))));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let product = row.product_id.and_then(|id| products.get(&id).cloned());
                row.into_entry(product)
            })
            .collect())
    }
}
