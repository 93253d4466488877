//! The scheduled reconciliation loop.
//!
//! One pass walks every tracked clip serially, refreshing its engagement
//! metrics with a fixed inter-item delay, evicting clips that fail three
//! times in a row, then recomputing campaign aggregates and driving
//! completion/payouts.

mod aggregator;
pub mod payout;

pub use aggregator::{reconcile_campaigns, CampaignOutcome};

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::audit::{log_event, LogCategory, LogLevel};
use crate::config::Config;
use crate::constants::{EVICTION_THRESHOLD, USER_AGENT};
use crate::db::{
    delete_clip, increment_clip_error_count, list_clips, update_clip_metrics, Clip, Database,
};
use crate::error::{ExtractError, PassError};
use crate::extractor::{normalize_url, ClipMetrics, ExtractorRegistry, UrlResolver};
use crate::status::StatusSink;

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PassSummary {
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
    pub evicted: usize,
    pub campaigns_evaluated: usize,
    pub campaigns_completed: usize,
    pub started_at: String,
    pub finished_at: String,
}

impl PassSummary {
    fn one_liner(&self) -> String {
        format!(
            "reconciliation pass: {} clips processed, {} updated, {} failed, {} evicted, {} campaigns completed",
            self.processed, self.updated, self.failed, self.evicted, self.campaigns_completed
        )
    }
}

/// The reconciliation engine. Shared between the scheduled loop and the
/// on-demand admin trigger; the run lock keeps the two mutually exclusive.
pub struct Reconciler {
    config: Config,
    db: Database,
    registry: Arc<ExtractorRegistry>,
    resolver: Arc<dyn UrlResolver>,
    status: Arc<dyn StatusSink>,
    http: reqwest::Client,
    run_lock: Arc<Mutex<()>>,
    last_pass: RwLock<Option<PassSummary>>,
}

impl Reconciler {
    /// Build a reconciler.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: Config,
        db: Database,
        registry: Arc<ExtractorRegistry>,
        resolver: Arc<dyn UrlResolver>,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            db,
            registry,
            resolver,
            status,
            http,
            run_lock: Arc::new(Mutex::new(())),
            last_pass: RwLock::new(None),
        })
    }

    /// Whether a pass currently holds the run lock.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// The summary of the most recently finished pass, if any.
    pub async fn last_pass(&self) -> Option<PassSummary> {
        self.last_pass.read().await.clone()
    }

    /// Run the scheduled reconciliation loop forever.
    pub async fn run_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.reconcile_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so startup does not
        // trigger an unscheduled pass.
        interval.tick().await;

        loop {
            interval.tick().await;

            match self.run_once().await {
                Ok(summary) => {
                    info!(
                        processed = summary.processed,
                        failed = summary.failed,
                        evicted = summary.evicted,
                        completed = summary.campaigns_completed,
                        "Scheduled reconciliation pass complete"
                    );
                }
                Err(PassError::AlreadyRunning) => {
                    // A manual pass is still in flight; the next tick retries.
                    debug!("Skipping scheduled pass: run lock held");
                }
                Err(PassError::Failed(e)) => {
                    error!("Reconciliation pass failed: {e:#}");
                    log_event(
                        self.db.pool(),
                        LogLevel::Error,
                        LogCategory::System,
                        "reconciliation pass failed",
                        serde_json::json!({ "error": format!("{e:#}") }),
                    )
                    .await;
                }
            }
        }
    }

    /// Run one full pass, holding the run lock for its duration.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::AlreadyRunning`] if another pass holds the lock,
    /// or [`PassError::Failed`] if the pass fails at the top level.
    pub async fn run_once(&self) -> Result<PassSummary, PassError> {
        let _guard = self
            .run_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| PassError::AlreadyRunning)?;

        self.run_locked().await
    }

    /// Start a pass on a background task without waiting for it.
    ///
    /// The run lock is acquired before spawning, so a caller that gets `Ok`
    /// owns the pass it started; two concurrent callers cannot both be told
    /// they started one.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::AlreadyRunning`] if another pass holds the lock.
    pub fn spawn_pass(self: &Arc<Self>) -> Result<(), PassError> {
        let guard = self
            .run_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| PassError::AlreadyRunning)?;

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            match this.run_locked().await {
                Ok(summary) => {
                    info!(
                        processed = summary.processed,
                        evicted = summary.evicted,
                        completed = summary.campaigns_completed,
                        "On-demand reconciliation pass complete"
                    );
                }
                Err(e) => {
                    error!("On-demand reconciliation pass failed: {e}");
                }
            }
        });

        Ok(())
    }

    /// The body of a pass; the caller must hold the run lock.
    async fn run_locked(&self) -> Result<PassSummary, PassError> {
        let summary = self.run_pass().await?;

        self.status.report_status(&summary.one_liner()).await;
        *self.last_pass.write().await = Some(summary.clone());

        Ok(summary)
    }

    async fn run_pass(&self) -> Result<PassSummary> {
        let started_at = Utc::now().to_rfc3339();

        // The only top-level, non-item-scoped failure point of a pass.
        let clips = list_clips(self.db.pool())
            .await
            .context("Failed to list clips for reconciliation")?;

        info!(clips = clips.len(), "Starting reconciliation pass");

        let mut summary = PassSummary {
            started_at,
            ..PassSummary::default()
        };

        for clip in &clips {
            // Minimum spacing between outbound calls, regardless of the
            // previous item's outcome and including the first item.
            tokio::time::sleep(self.config.clip_delay).await;

            summary.processed += 1;
            match self.refresh_clip(clip).await {
                Ok(metrics) => {
                    update_clip_metrics(
                        self.db.pool(),
                        clip.id,
                        metrics.views,
                        metrics.likes,
                        &Utc::now().to_rfc3339(),
                    )
                    .await?;
                    summary.updated += 1;
                    debug!(clip_id = clip.id, views = metrics.views, "Updated clip metrics");
                }
                Err(e) => {
                    summary.failed += 1;
                    if self.record_failure(clip, &e).await? {
                        summary.evicted += 1;
                    }
                }
            }
        }

        let outcome = reconcile_campaigns(&self.db).await?;
        summary.campaigns_evaluated = outcome.evaluated;
        summary.campaigns_completed = outcome.completed;
        summary.finished_at = Utc::now().to_rfc3339();

        Ok(summary)
    }

    /// Resolve, classify, and extract metrics for one clip.
    async fn refresh_clip(&self, clip: &Clip) -> Result<ClipMetrics, ExtractError> {
        let canonical = self.resolver.resolve(&clip.url).await?;
        let canonical = normalize_url(&canonical);

        let extractor = self.registry.find(&canonical).ok_or_else(|| {
            ExtractError::Validation(format!("no platform recognizes URL: {canonical}"))
        })?;

        extractor.extract(&canonical, &self.http, &self.config).await
    }

    /// Record an extraction failure; returns true when the clip was evicted.
    async fn record_failure(&self, clip: &Clip, err: &ExtractError) -> Result<bool> {
        let errors = increment_clip_error_count(self.db.pool(), clip.id).await?;

        if errors >= EVICTION_THRESHOLD {
            delete_clip(self.db.pool(), clip.id).await?;
            log_event(
                self.db.pool(),
                LogLevel::Audit,
                LogCategory::Clip,
                "clip evicted after repeated extraction failures",
                serde_json::json!({
                    "clip_id": clip.id,
                    "url": clip.url,
                    "consecutive_errors": errors,
                }),
            )
            .await;
            return Ok(true);
        }

        log_event(
            self.db.pool(),
            LogLevel::Error,
            LogCategory::Metadata,
            "clip metric extraction failed",
            serde_json::json!({
                "clip_id": clip.id,
                "url": clip.url,
                "error": err.to_string(),
                "consecutive_errors": errors,
            }),
        )
        .await;
        Ok(false)
    }
}
