//! Reporting Aggregator
//!
//! Read-only dashboard metrics over one shop's ledger and catalog.

mod service;

pub use service::{
    Dashboard, ReportingService, TopProduct, TransactionCounts, LOW_STOCK_THRESHOLD,
    TOP_PRODUCTS_LIMIT,
};
