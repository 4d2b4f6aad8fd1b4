//! Database access for revu-ingest
//!
//! Reviews live in a single SQLite table; the service owns its schema and
//! creates it at startup.

pub mod reviews;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Initialize database connection pool
///
/// Accepts any SQLite URL (`sqlite://path/to/revu.db`, `sqlite::memory:`).
/// The database file and its parent directory are created when missing.
pub async fn init_database_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let db_path = options.get_filename().to_path_buf();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::debug!("Connecting to database: {}", database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the reviews table and its lookup index if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            review_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL,
            review_text TEXT NOT NULL,
            rating REAL NOT NULL DEFAULT 3.0,
            review_date TEXT NOT NULL,
            source TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reviews_product_day ON reviews (product_id, review_date)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (reviews)");

    Ok(())
}
