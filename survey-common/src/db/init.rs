//! Database initialization
//!
//! Opens (or creates) the SQLite file backing the results store and makes
//! sure the `survey_results` table exists.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every connection
///
/// Concurrent submissions wait on SQLite's writer lock instead of failing.
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new results store: {}", db_path.display());
    } else {
        info!("Opened existing results store: {}", db_path.display());
    }

    create_results_table(&pool).await?;

    Ok(pool)
}

/// Create the append-only results table
///
/// Column names match the downloadable spreadsheet header.
pub async fn create_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS survey_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            Image_Number INTEGER NOT NULL,
            User_Selection TEXT NOT NULL,
            Confidence INTEGER NOT NULL,
            Actual_Type TEXT NOT NULL,
            Is_Correct INTEGER NOT NULL,
            Image_Path TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_survey_results_timestamp ON survey_results(timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
