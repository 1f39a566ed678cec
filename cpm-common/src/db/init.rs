//! Database initialization
//!
//! Creates the database file on first run and applies the schema. Safe to
//! call on every startup; all DDL is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while a background task writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Apply the schema (idempotent - safe to call multiple times).
///
/// Timestamps are stored as TEXT in the fixed `%Y-%m-%d %H:%M:%S` format;
/// `exit_time` is NULL while no planned exit has been recorded.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate_number TEXT NOT NULL,
            entry_time TEXT NOT NULL,
            exit_time TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_creates_file_and_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("cpm.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        // Schema should accept a plain insert
        sqlx::query("INSERT INTO vehicles (plate_number, entry_time) VALUES (?, ?)")
            .bind("1-ABC-123")
            .bind("2024-01-01 08:00:00")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();
    }
}
