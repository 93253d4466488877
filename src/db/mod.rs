mod migrations;
mod models;
mod queries;

pub use models::*;
pub use queries::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::info;

// The reconciler and the admin surface write concurrently; WAL plus a
// generous busy timeout keeps the loser of a write race waiting instead of
// surfacing SQLITE_BUSY mid-pass.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the clip ledger database and bring its
    /// schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written, or if a
    /// migration fails.
    pub async fn new(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;

        migrations::run(&pool).await?;
        info!("Database migrations complete");

        let db = Self { pool };
        db.verify_writable(path).await?;
        Ok(db)
    }

    /// Prove the tables the reconciler writes accept inserts before the
    /// first pass needs them. A read-only volume mount otherwise only shows
    /// up mid-pass as "attempt to write a readonly database".
    async fn verify_writable(&self, path: &Path) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin SQLite writability check")?;

        sqlx::query(
            "INSERT INTO logs (level, category, message) VALUES ('INFO', 'SYSTEM', 'startup write check')",
        )
        .execute(&mut *tx)
        .await
        .with_context(|| {
            format!(
                "SQLite database is not writable (path: {}). Check volume mount permissions/ownership",
                path.display()
            )
        })?;

        // The check row is discarded; only reaching the WAL matters.
        tx.rollback()
            .await
            .context("Failed to roll back SQLite writability check")?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
