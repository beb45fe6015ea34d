//! Common test utilities

#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tempfile::TempDir;

use shop_ledger::auth::{hash_password, TokenService};
use shop_ledger::catalog::CatalogStore;
use shop_ledger::config::Config;
use shop_ledger::db;
use shop_ledger::domain::{NewProduct, Product, Role, User};
use shop_ledger::AppState;

/// Fresh in-memory database with the schema applied
pub async fn setup_test_db() -> SqlitePool {
    let config = Config::for_tests();
    let pool = db::connect(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to open in-memory database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// File-backed database behind a multi-connection pool.
///
/// Writes and reads land on different connections here, unlike the
/// single-connection in-memory pool.
pub struct FileDb {
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn setup_file_db(max_connections: u32) -> FileDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let database_url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.db").display());

    let pool = db::connect(&database_url, max_connections)
        .await
        .expect("Failed to open file database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    FileDb { pool, _dir: dir }
}

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState::new(pool, Config::for_tests())
}

pub fn test_tokens() -> TokenService {
    let config = Config::for_tests();
    TokenService::new(&config.jwt_secret, config.jwt_expiration_hours)
}

pub async fn seed_shop(pool: &SqlitePool, name: &str, active: bool) -> i64 {
    sqlx::query(
        "INSERT INTO shops (name, active, contact_number, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(name)
    .bind(active)
    .bind("22670000000")
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("Failed to seed shop")
    .last_insert_rowid()
}

pub async fn seed_user(pool: &SqlitePool, shop_id: i64, email: &str, role: Role) -> User {
    let password_hash = hash_password("password123").expect("Failed to hash password");
    let created_at = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, role, shop_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind("Test User")
    .bind(email)
    .bind(&password_hash)
    .bind(role)
    .bind(shop_id)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("Failed to seed user")
    .last_insert_rowid();

    User {
        id,
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash,
        role,
        shop_id,
        created_at,
    }
}

/// Product priced in whole currency units
pub async fn seed_product(
    pool: &SqlitePool,
    shop_id: i64,
    name: &str,
    purchase: i64,
    selling: i64,
    stock: i64,
) -> Product {
    CatalogStore::new(pool.clone())
        .create(
            shop_id,
            NewProduct {
                name: name.to_string(),
                description: None,
                category: None,
                image_url: None,
                purchase_price: Decimal::from(purchase),
                selling_price: Decimal::from(selling),
                stock,
            },
        )
        .await
        .expect("Failed to seed product")
}

pub async fn product_stock(pool: &SqlitePool, product_id: i64) -> i64 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read stock")
}

pub async fn entry_count(pool: &SqlitePool, shop_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE shop_id = ?1")
        .bind(shop_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count entries")
}
