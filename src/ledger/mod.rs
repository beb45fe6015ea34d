//! Ledger Engine
//!
//! Records sales, expenses and withdrawals. A sale's stock decrement and its
//! ledger row commit together or not at all; deleting a sale puts the stock
//! back in the same transaction that removes the row.

mod engine;

pub use engine::{DeletedEntry, LedgerEngine, RecordedEntry};

use rust_decimal::Decimal;

use crate::domain::{Amount, DomainError, EntryKind, RecordEntry};

impl RecordEntry {
    /// Build a ledger write from loosely-typed input.
    ///
    /// Sales need a product and a positive quantity; any amount sent along
    /// with a sale is ignored because the engine prices it. Expenses and
    /// withdrawals need a positive amount.
    pub fn from_parts(
        kind: EntryKind,
        product_id: Option<i64>,
        quantity: Option<i64>,
        amount: Option<Decimal>,
    ) -> Result<Self, DomainError> {
        match kind {
            EntryKind::Sale => {
                let product_id = product_id
                    .ok_or_else(|| DomainError::validation("product_id is required for a sale"))?;
                let quantity = quantity.unwrap_or(0);
                if quantity <= 0 {
                    return Err(DomainError::validation(
                        "quantity must be greater than zero for a sale",
                    ));
                }
                Ok(RecordEntry::Sale {
                    product_id,
                    quantity,
                })
            }
            EntryKind::Expense | EntryKind::Withdrawal => {
                let value = amount.ok_or_else(|| DomainError::validation("amount is required"))?;
                let amount = Amount::new(value)?;
                Ok(match kind {
                    EntryKind::Expense => RecordEntry::Expense { amount },
                    _ => RecordEntry::Withdrawal { amount },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sale_requires_product_and_quantity() {
        assert!(RecordEntry::from_parts(EntryKind::Sale, None, Some(1), None).is_err());
        assert!(RecordEntry::from_parts(EntryKind::Sale, Some(1), None, None).is_err());
        assert!(RecordEntry::from_parts(EntryKind::Sale, Some(1), Some(0), None).is_err());
        assert!(RecordEntry::from_parts(EntryKind::Sale, Some(1), Some(-2), None).is_err());

        let sale = RecordEntry::from_parts(EntryKind::Sale, Some(4), Some(2), Some(dec!(1))).unwrap();
        assert_eq!(
            sale,
            RecordEntry::Sale {
                product_id: 4,
                quantity: 2
            }
        );
    }

    #[test]
    fn test_expense_and_withdrawal_need_positive_amount() {
        assert!(RecordEntry::from_parts(EntryKind::Expense, None, None, None).is_err());
        assert!(RecordEntry::from_parts(EntryKind::Expense, None, None, Some(dec!(0))).is_err());
        assert!(RecordEntry::from_parts(EntryKind::Withdrawal, None, None, Some(dec!(-3))).is_err());

        let expense =
            RecordEntry::from_parts(EntryKind::Expense, None, None, Some(dec!(25.50))).unwrap();
        assert_eq!(expense.kind(), EntryKind::Expense);

        let withdrawal =
            RecordEntry::from_parts(EntryKind::Withdrawal, Some(9), Some(3), Some(dec!(10))).unwrap();
        assert_eq!(withdrawal.kind(), EntryKind::Withdrawal);
    }
}
