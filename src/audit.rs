//! Durable audit log.
//!
//! Every state change and failure the engine cares about is written as a
//! structured row in the `logs` table and mirrored to `tracing`. Writing a
//! log row is best-effort: a failed insert is reported via `tracing` and
//! never aborts the caller.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Audit,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Audit => "AUDIT",
        }
    }
}

/// Subsystem an audit entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogCategory {
    Metadata,
    Campaign,
    Clip,
    Payment,
    System,
}

impl LogCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "METADATA",
            Self::Campaign => "CAMPAIGN",
            Self::Clip => "CLIP",
            Self::Payment => "PAYMENT",
            Self::System => "SYSTEM",
        }
    }
}

/// A persisted audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: i64,
    pub level: String,
    pub category: String,
    pub message: String,
    pub metadata: Option<String>,
    pub timestamp: String,
}

/// Write an audit entry. Never fails from the caller's perspective.
pub async fn log_event(
    pool: &SqlitePool,
    level: LogLevel,
    category: LogCategory,
    message: &str,
    metadata: serde_json::Value,
) {
    match level {
        LogLevel::Error => error!(category = category.as_str(), %metadata, "{message}"),
        LogLevel::Warning => warn!(category = category.as_str(), %metadata, "{message}"),
        _ => info!(
            category = category.as_str(),
            level = level.as_str(),
            %metadata,
            "{message}"
        ),
    }

    let result = sqlx::query("INSERT INTO logs (level, category, message, metadata) VALUES (?, ?, ?, ?)")
        .bind(level.as_str())
        .bind(category.as_str())
        .bind(message)
        .bind(metadata.to_string())
        .execute(pool)
        .await;

    if let Err(e) = result {
        error!("Failed to persist audit log entry: {e:#}");
    }
}

/// Fetch the most recent audit entries, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn recent_logs(pool: &SqlitePool, limit: i64) -> anyhow::Result<Vec<LogEntry>> {
    use anyhow::Context;

    sqlx::query_as("SELECT * FROM logs ORDER BY timestamp DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to fetch recent logs")
}
