//! Concurrent sale load tool
//!
//! Run with: cargo run --bin load_test --release -- --sales 1000 --workers 16
//!
//! Seeds one product with stock for half the sales, fires every sale
//! concurrently, and checks that stock never went negative.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::Utc;
use rust_decimal::Decimal;

use shop_ledger::catalog::CatalogStore;
use shop_ledger::db;
use shop_ledger::domain::{DomainError, NewProduct};
use shop_ledger::ledger::LedgerEngine;
use shop_ledger::AppError;

#[derive(Debug, Default)]
struct WorkerTally {
    succeeded: u64,
    out_of_stock: u64,
    other: u64,
}

fn arg_value(args: &[String], flag: &str, default: u64) -> anyhow::Result<u64> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .with_context(|| format!("{flag} expects a value"))?
            .parse()
            .with_context(|| format!("{flag} expects a positive integer")),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let sales = arg_value(&args, "--sales", 1000)?;
    let workers = arg_value(&args, "--workers", 8)?.max(1);
    let stock = (sales / 2) as i64;

    let path = std::env::temp_dir().join(format!("shop_ledger_load_{}.db", uuid::Uuid::new_v4()));
    let database_url = format!("sqlite://{}?mode=rwc", path.display());

    println!("Load Test - {} concurrent sales across {} workers", sales, workers);
    println!("Database: {}", path.display());

    let pool = db::connect(&database_url, workers as u32).await?;
    db::run_migrations(&pool).await?;

    let shop_id = sqlx::query(
        "INSERT INTO shops (name, active, contact_number, created_at) VALUES (?1, 1, ?2, ?3)",
    )
    .bind("Load Test Shop")
    .bind("0000000000")
    .bind(Utc::now())
    .execute(&pool)
    .await?
    .last_insert_rowid();

    let product = CatalogStore::new(pool.clone())
        .create(
            shop_id,
            NewProduct {
                name: "Load Test Product".to_string(),
                description: None,
                category: None,
                image_url: None,
                purchase_price: Decimal::new(600, 2),
                selling_price: Decimal::new(1000, 2),
                stock,
            },
        )
        .await?;

    println!("Seeded product {} with stock {}", product.id, stock);

    let engine = Arc::new(LedgerEngine::new(pool.clone()));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(workers as usize);
    for worker in 0..workers {
        // Spread the remainder over the first workers
        let share = sales / workers + u64::from(worker < sales % workers);
        let engine = Arc::clone(&engine);
        let product_id = product.id;

        handles.push(tokio::spawn(async move {
            let mut tally = WorkerTally::default();
            for _ in 0..share {
                match engine.record_sale(shop_id, product_id, 1).await {
                    Ok(_) => tally.succeeded += 1,
                    Err(AppError::Domain(DomainError::InsufficientStock { .. })) => {
                        tally.out_of_stock += 1
                    }
                    Err(e) => {
                        eprintln!("Worker {} sale failed: {}", worker, e);
                        tally.other += 1;
                    }
                }
            }
            tally
        }));
    }

    let mut total = WorkerTally::default();
    for handle in handles {
        let tally = handle.await?;
        total.succeeded += tally.succeeded;
        total.out_of_stock += tally.out_of_stock;
        total.other += tally.other;
    }

    let elapsed = start.elapsed();
    let final_stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product.id)
        .fetch_one(&pool)
        .await?;
    let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE shop_id = ?1")
        .bind(shop_id)
        .fetch_one(&pool)
        .await?;

    println!("\n=== Load Test Results ===");
    println!("Total sales: {}", sales);
    println!("Succeeded: {}", total.succeeded);
    println!("Insufficient stock: {}", total.out_of_stock);
    println!("Other failures: {}", total.other);
    println!("Final stock: {}", final_stock);
    println!("Ledger entries: {}", recorded);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Rate: {:.0} sales/sec", sales as f64 / elapsed.as_secs_f64());

    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }

    if total.other > 0 {
        bail!("{} sales failed for reasons other than stock", total.other);
    }
    if total.succeeded != stock as u64 || total.out_of_stock != sales - stock as u64 {
        bail!(
            "expected {} successes and {} stock rejections",
            stock,
            sales - stock as u64
        );
    }
    if final_stock != 0 || recorded != stock {
        bail!("stock invariant violated: final stock {}, {} entries", final_stock, recorded);
    }

    println!("Stock invariant held");
    Ok(())
}
