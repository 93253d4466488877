//! Minimal admin surface.
//!
//! Exposes a health probe, the last pass summary, and an on-demand trigger
//! that runs the identical pass logic as the scheduler. The trigger answers
//! 409 while a pass is in flight; the run lock inside the reconciler is the
//! actual mutual-exclusion guarantee.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::audit::recent_logs;
use crate::config::Config;
use crate::db::{get_campaign, list_payments_by_campaign, Database};
use crate::error::PassError;
use crate::reconciler::Reconciler;

#[derive(Clone)]
struct AppState {
    reconciler: Arc<Reconciler>,
    db: Database,
    admin_token: Option<String>,
}

/// Serve the admin API until the process shuts down.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn serve(config: Config, db: Database, reconciler: Arc<Reconciler>) -> Result<()> {
    let app = router(&config, db, reconciler);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind admin server to {addr}"))?;

    info!(addr = %addr, "Admin server listening");
    axum::serve(listener, app)
        .await
        .context("Admin server error")?;

    Ok(())
}

/// Build the admin router. Split out from [`serve`] so tests can drive the
/// routes without binding a listener.
#[must_use]
pub fn router(config: &Config, db: Database, reconciler: Arc<Reconciler>) -> Router {
    let state = AppState {
        reconciler,
        db,
        admin_token: config.admin_token.clone(),
    };

    Router::new()
        .route("/healthz", get(healthz))
        .route("/admin/status", get(admin_status))
        .route("/admin/campaigns/:id", get(admin_campaign))
        .route("/admin/reconcile", post(admin_reconcile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if provided == Some(expected) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn admin_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    authorize(&state, &headers)?;

    let last_pass = state.reconciler.last_pass().await;
    let logs = recent_logs(state.db.pool(), 20).await.map_err(|e| {
        error!("Failed to fetch recent logs: {e:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({
        "running": state.reconciler.is_running(),
        "last_pass": last_pass,
        "recent_logs": logs,
    })))
}

async fn admin_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    authorize(&state, &headers)?;

    let campaign = get_campaign(state.db.pool(), id)
        .await
        .map_err(|e| {
            error!("Failed to fetch campaign {id}: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let payments = list_payments_by_campaign(state.db.pool(), id).await.map_err(|e| {
        error!("Failed to fetch payments for campaign {id}: {e:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({
        "campaign": campaign,
        "payments": payments,
    })))
}

async fn admin_reconcile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    authorize(&state, &headers)?;

    // Acquiring the run lock and answering happen in one step; a 202 means
    // this request's pass owns the lock.
    match state.reconciler.spawn_pass() {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(json!({ "started": true })))),
        Err(PassError::AlreadyRunning) => Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "a reconciliation pass is already running" })),
        )),
        Err(PassError::Failed(e)) => {
            error!("Failed to start reconciliation pass: {e:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
