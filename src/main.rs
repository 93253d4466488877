use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clipledger::config::Config;
use clipledger::db::Database;
use clipledger::extractor::{ExtractorRegistry, HttpUrlResolver};
use clipledger::reconciler::Reconciler;
use clipledger::status::LogStatusSink;
use clipledger::web;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting clipledger");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        interval_secs = config.reconcile_interval.as_secs(),
        clip_delay_ms = config.clip_delay.as_millis() as u64,
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    let registry = Arc::new(ExtractorRegistry::builtin());
    let resolver = Arc::new(HttpUrlResolver::new(config.http_timeout)?);
    let status = Arc::new(LogStatusSink);

    let reconciler = Arc::new(Reconciler::new(
        config.clone(),
        db.clone(),
        registry,
        resolver,
        status,
    )?);

    // Scheduled reconciliation loop
    let loop_reconciler = Arc::clone(&reconciler);
    let loop_handle = tokio::spawn(async move {
        loop_reconciler.run_loop().await;
    });
    info!("Reconciliation scheduler started");

    // Admin web server (health, status, on-demand trigger)
    let web_config = config.clone();
    let web_db = db.clone();
    let web_reconciler = Arc::clone(&reconciler);
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(web_config, web_db, web_reconciler).await {
            error!("Admin server error: {e:#}");
        }
    });

    shutdown_signal().await;

    info!("Shutting down...");

    web_handle.abort();
    loop_handle.abort();

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,clipledger=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
