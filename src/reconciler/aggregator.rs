//! Campaign aggregation and lifecycle.
//!
//! Runs after every clip pass: recomputes per-campaign totals from the
//! surviving clips and drives the single automatic state transition,
//! ACTIVE -> COMPLETED, creating payouts in the same transaction.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info};

use super::payout::{partition_payouts, round_cents};
use crate::audit::{log_event, LogCategory, LogLevel};
use crate::db::{
    complete_campaign_with_payments, list_campaigns, list_clips_by_campaign,
    update_campaign_totals, Campaign, CampaignStatus, Database,
};

/// Counts from one aggregation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CampaignOutcome {
    pub evaluated: usize,
    pub totals_updated: usize,
    pub completed: usize,
}

/// Recompute totals for every campaign and complete those that have reached
/// their spending cap.
///
/// PAUSED campaigns are frozen entirely (no totals update, no completion
/// evaluation) and COMPLETED campaigns are terminal, which makes the
/// completion transition at-most-once across passes.
pub async fn reconcile_campaigns(db: &Database) -> Result<CampaignOutcome> {
    let campaigns = list_campaigns(db.pool())
        .await
        .context("Failed to list campaigns for aggregation")?;

    let mut outcome = CampaignOutcome::default();

    for campaign in campaigns {
        match CampaignStatus::from_str(&campaign.status) {
            Some(CampaignStatus::Active) => {
                outcome.evaluated += 1;
                reconcile_one(db, &campaign, &mut outcome).await?;
            }
            Some(CampaignStatus::Paused | CampaignStatus::Completed) => {
                debug!(
                    campaign_id = campaign.id,
                    status = %campaign.status,
                    "Skipping campaign"
                );
            }
            None => {
                anyhow::bail!(
                    "campaign {} has unknown status {:?}",
                    campaign.id,
                    campaign.status
                );
            }
        }
    }

    Ok(outcome)
}

async fn reconcile_one(
    db: &Database,
    campaign: &Campaign,
    outcome: &mut CampaignOutcome,
) -> Result<()> {
    let clips = list_clips_by_campaign(db.pool(), campaign.id).await?;

    let new_total_views: i64 = clips.iter().map(|c| c.views).sum();
    let new_total_likes: i64 = clips.iter().map(|c| c.likes).sum();

    if new_total_views != campaign.total_views || new_total_likes != campaign.total_likes {
        update_campaign_totals(db.pool(), campaign.id, new_total_views, new_total_likes).await?;
        outcome.totals_updated += 1;
        debug!(
            campaign_id = campaign.id,
            total_views = new_total_views,
            "Updated campaign totals"
        );
    }

    let potential_earnings = new_total_views as f64 * campaign.rate;
    if potential_earnings < campaign.max_payout {
        return Ok(());
    }

    let payments = partition_payouts(campaign.id, campaign.rate, &clips);
    let end_date = Utc::now().to_rfc3339();
    let payment_ids = complete_campaign_with_payments(db.pool(), campaign.id, &end_date, &payments)
        .await
        .with_context(|| format!("Failed to complete campaign {}", campaign.id))?;

    outcome.completed += 1;
    info!(
        campaign_id = campaign.id,
        name = %campaign.name,
        total_views = new_total_views,
        payments = payment_ids.len(),
        "Campaign completed - max payout reached"
    );

    log_event(
        db.pool(),
        LogLevel::Audit,
        LogCategory::Campaign,
        "campaign completed: spending cap reached",
        serde_json::json!({
            "campaign_id": campaign.id,
            "name": campaign.name,
            "total_views": new_total_views,
            "earnings": round_cents(potential_earnings),
            "max_payout": campaign.max_payout,
        }),
    )
    .await;

    log_event(
        db.pool(),
        LogLevel::Audit,
        LogCategory::Payment,
        "payouts generated for completed campaign",
        serde_json::json!({
            "campaign_id": campaign.id,
            "payment_ids": payment_ids,
            "users": payments.len(),
            "total_amount": round_cents(payments.iter().map(|p| p.amount).sum()),
        }),
    )
    .await;

    Ok(())
}
