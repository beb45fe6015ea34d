//! Database module
//!
//! Pool construction, embedded migrations and schema verification.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Embedded migrations from `migrations/`
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Tables the application cannot run without
const REQUIRED_TABLES: &[&str] = &["shops", "users", "products", "ledger_entries"];

/// Open a connection pool.
///
/// Foreign keys are enforced and writers wait on each other (busy timeout)
/// rather than failing, which is what serializes concurrent sales.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    // WAL does not apply to in-memory databases
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Every in-memory connection is its own database; keep exactly one.
    let max_connections = if in_memory { 1 } else { max_connections };

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if in_memory {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    pool_options.connect_with(options).await
}

/// Run pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Simple connectivity check
pub async fn verify_connection(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_schema() {
        let pool = connect("sqlite::memory:", 5).await.unwrap();
        verify_connection(&pool).await.unwrap();
        assert!(!check_schema(&pool).await.unwrap());

        run_migrations(&pool).await.unwrap();
        assert!(check_schema(&pool).await.unwrap());

        // Idempotent
        run_migrations(&pool).await.unwrap();
    }
}
