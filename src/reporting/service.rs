//! Dashboard computation.
//!
//! Sums are taken in cents by the store and converted once at the end.
//! Price-times-count totals are multiplied here in `i128`, since a single
//! product's stock value can exceed what SQLite keeps as an integer.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::catalog::CatalogStore;
use crate::domain::{money_from_cents, money_from_wide_cents, EntryKind, Product};
use crate::error::AppError;

/// Products with stock strictly below this count as low stock
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Number of best sellers reported on the dashboard
pub const TOP_PRODUCTS_LIMIT: i64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionCounts {
    pub sales: i64,
    pub expenses: i64,
    pub withdrawals: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub product_name: String,
    pub total_sold: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    pub total_withdrawals: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub net_profit: Decimal,
    pub gross_margin: Decimal,
    pub total_products: i64,
    pub low_stock_products: i64,
    pub stock_value: Decimal,
    pub transactions: TransactionCounts,
    pub top_products: Vec<TopProduct>,
}

/// Per-kind ledger totals in cents
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LedgerTotals {
    sales_cents: i64,
    expenses_cents: i64,
    withdrawals_cents: i64,
    sales_count: i64,
    expenses_count: i64,
    withdrawals_count: i64,
}

impl LedgerTotals {
    fn from_rows(rows: &[(EntryKind, i64, i64)]) -> Self {
        let mut totals = LedgerTotals::default();
        for &(kind, count, sum_cents) in rows {
            match kind {
                EntryKind::Sale => {
                    totals.sales_count = count;
                    totals.sales_cents = sum_cents;
                }
                EntryKind::Expense => {
                    totals.expenses_count = count;
                    totals.expenses_cents = sum_cents;
                }
                EntryKind::Withdrawal => {
                    totals.withdrawals_count = count;
                    totals.withdrawals_cents = sum_cents;
                }
            }
        }
        totals
    }
}

/// Product counts for the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, sqlx::FromRow)]
struct CatalogCounts {
    total_products: i64,
    low_stock_products: i64,
}

/// Sum of `unit_cents * count` over `(unit_cents, count)` rows
fn weighted_cents(rows: &[(i64, i64)]) -> i128 {
    rows.iter()
        .map(|&(unit_cents, count)| i128::from(unit_cents) * i128::from(count))
        .sum()
}

impl Dashboard {
    fn assemble(
        ledger: LedgerTotals,
        cogs_cents: i128,
        catalog: CatalogCounts,
        stock_value_cents: i128,
        top_products: Vec<TopProduct>,
    ) -> Result<Self, AppError> {
        let total_sales = money_from_cents(ledger.sales_cents);
        let total_expenses = money_from_cents(ledger.expenses_cents);
        let cost_of_goods_sold = money_from_wide_cents(cogs_cents)
            .map_err(|e| AppError::Internal(format!("cost of goods sold: {e}")))?;
        let stock_value = money_from_wide_cents(stock_value_cents)
            .map_err(|e| AppError::Internal(format!("stock value: {e}")))?;
        let gross_margin = total_sales - cost_of_goods_sold;

        Ok(Dashboard {
            total_sales,
            total_expenses,
            total_withdrawals: money_from_cents(ledger.withdrawals_cents),
            cost_of_goods_sold,
            net_profit: gross_margin - total_expenses,
            gross_margin,
            total_products: catalog.total_products,
            low_stock_products: catalog.low_stock_products,
            stock_value,
            transactions: TransactionCounts {
                sales: ledger.sales_count,
                expenses: ledger.expenses_count,
                withdrawals: ledger.withdrawals_count,
                total: ledger.sales_count + ledger.expenses_count + ledger.withdrawals_count,
            },
            top_products,
        })
    }
}

/// Aggregates computed fresh on every call
#[derive(Debug, Clone)]
pub struct ReportingService {
    pool: SqlitePool,
}

impl ReportingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self, shop_id: i64) -> Result<Dashboard, AppError> {
        let ledger_rows: Vec<(EntryKind, i64, i64)> = sqlx::query_as(
            r#"
            SELECT kind, COUNT(*), COALESCE(SUM(amount_cents), 0)
            FROM ledger_entries
            WHERE shop_id = ?1
            GROUP BY kind
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        // Sales whose product was deleted drop out of the join.
        let sold_units: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT p.purchase_price_cents, SUM(e.quantity)
            FROM ledger_entries e
            JOIN products p ON p.id = e.product_id AND p.shop_id = e.shop_id
            WHERE e.shop_id = ?1 AND e.kind = ?2
            GROUP BY p.id, p.purchase_price_cents
            "#,
        )
        .bind(shop_id)
        .bind(EntryKind::Sale)
        .fetch_all(&self.pool)
        .await?;

        let catalog: CatalogCounts = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(CASE WHEN stock < ?2 THEN 1 ELSE 0 END), 0) AS low_stock_products
            FROM products
            WHERE shop_id = ?1
            "#,
        )
        .bind(shop_id)
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(&self.pool)
        .await?;

        let stocked: Vec<(i64, i64)> =
            sqlx::query_as("SELECT purchase_price_cents, stock FROM products WHERE shop_id = ?1")
                .bind(shop_id)
                .fetch_all(&self.pool)
                .await?;

        let top_products = self.top_products(shop_id).await?;

        let dashboard = Dashboard::assemble(
            LedgerTotals::from_rows(&ledger_rows),
            weighted_cents(&sold_units),
            catalog,
            weighted_cents(&stocked),
            top_products,
        )?;

        tracing::debug!(
            shop_id,
            total_sales = %dashboard.total_sales,
            net_profit = %dashboard.net_profit,
            "Dashboard computed"
        );

        Ok(dashboard)
    }

    async fn top_products(&self, shop_id: i64) -> Result<Vec<TopProduct>, AppError> {
        let rows: Vec<(i64, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT e.product_id, p.name, SUM(e.quantity) AS total_sold, SUM(e.amount_cents)
            FROM ledger_entries e
            JOIN products p ON p.id = e.product_id AND p.shop_id = e.shop_id
            WHERE e.shop_id = ?1 AND e.kind = ?2
            GROUP BY e.product_id, p.name
            ORDER BY total_sold DESC, e.product_id ASC
            LIMIT ?3
            "#,
        )
        .bind(shop_id)
        .bind(EntryKind::Sale)
        .bind(TOP_PRODUCTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, product_name, total_sold, amount_cents)| TopProduct {
                product_id,
                product_name,
                total_sold,
                total_amount: money_from_cents(amount_cents),
            })
            .collect())
    }

    /// Products under the low-stock threshold, lowest first
    pub async fn low_stock(&self, shop_id: i64) -> Result<Vec<Product>, AppError> {
        CatalogStore::new(self.pool.clone())
            .low_stock(shop_id, LOW_STOCK_THRESHOLD)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assemble_identities() {
        let ledger = LedgerTotals::from_rows(&[
            (EntryKind::Sale, 2, 30_000),
            (EntryKind::Expense, 1, 2_500),
            (EntryKind::Withdrawal, 3, 1_000),
        ]);
        let catalog = CatalogCounts {
            total_products: 4,
            low_stock_products: 1,
        };

        let dashboard = Dashboard::assemble(ledger, 18_000, catalog, 42_000, Vec::new()).unwrap();

        assert_eq!(dashboard.total_sales, dec!(300));
        assert_eq!(dashboard.cost_of_goods_sold, dec!(180));
        assert_eq!(dashboard.gross_margin, dec!(120));
        assert_eq!(dashboard.net_profit, dec!(95));
        assert_eq!(
            dashboard.net_profit,
            dashboard.total_sales - dashboard.cost_of_goods_sold - dashboard.total_expenses
        );
        assert_eq!(dashboard.total_withdrawals, dec!(10));
        assert_eq!(dashboard.stock_value, dec!(420));
        assert_eq!(dashboard.transactions.total, 6);
    }

    #[test]
    fn test_empty_ledger() {
        let dashboard = Dashboard::assemble(
            LedgerTotals::from_rows(&[]),
            0,
            CatalogCounts::default(),
            0,
            Vec::new(),
        )
        .unwrap();

        assert_eq!(dashboard.total_sales, Decimal::ZERO);
        assert_eq!(dashboard.net_profit, Decimal::ZERO);
        assert_eq!(dashboard.transactions, TransactionCounts::default());
    }

    #[test]
    fn test_expenses_can_make_profit_negative() {
        let ledger = LedgerTotals::from_rows(&[(EntryKind::Expense, 1, 5_000)]);
        let dashboard =
            Dashboard::assemble(ledger, 0, CatalogCounts::default(), 0, Vec::new()).unwrap();
        assert_eq!(dashboard.net_profit, dec!(-50));
    }

    #[test]
    fn test_weighted_cents_exceeds_i64() {
        // 1e12 units at 1e8 in stock
        let rows = [(100_000_000_000_000, 100_000_000), (250, 4)];
        let cents = weighted_cents(&rows);
        assert_eq!(cents, 10_000_000_000_000_000_000_000 + 1_000);
        assert!(cents > i128::from(i64::MAX));
    }
}
