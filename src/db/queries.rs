use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{Campaign, CampaignStatus, Clip, NewCampaign, NewClip, NewPayment, Payment};

// ========== Clips ==========

/// List every tracked clip, oldest first.
pub async fn list_clips(pool: &SqlitePool) -> Result<Vec<Clip>> {
    sqlx::query_as("SELECT * FROM clips ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list clips")
}

/// Get a clip by id.
pub async fn get_clip(pool: &SqlitePool, id: i64) -> Result<Option<Clip>> {
    sqlx::query_as("SELECT * FROM clips WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch clip")
}

/// Insert a newly submitted clip, returning its id.
pub async fn insert_clip(pool: &SqlitePool, clip: &NewClip) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO clips (url, platform, campaign_id, user_id)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(&clip.url)
    .bind(clip.platform.as_str())
    .bind(clip.campaign_id)
    .bind(&clip.user_id)
    .execute(pool)
    .await
    .context("Failed to insert clip")?;

    Ok(result.last_insert_rowid())
}

/// Overwrite a clip's engagement metrics after a successful extraction.
///
/// Resets the consecutive-error counter.
pub async fn update_clip_metrics(
    pool: &SqlitePool,
    id: i64,
    views: i64,
    likes: i64,
    updated_at: &str,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE clips
        SET views = ?, likes = ?, last_metadata_update = ?, consecutive_errors = 0
        WHERE id = ?
        ",
    )
    .bind(views)
    .bind(likes)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update clip metrics")?;

    Ok(())
}

/// Increment a clip's consecutive-error counter, returning the new value.
pub async fn increment_clip_error_count(pool: &SqlitePool, id: i64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r"
        UPDATE clips
        SET consecutive_errors = consecutive_errors + 1
        WHERE id = ?
        RETURNING consecutive_errors
        ",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .context("Failed to increment clip error count")?;

    Ok(row.0)
}

/// Delete a clip (eviction).
pub async fn delete_clip(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM clips WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete clip")?;

    Ok(())
}

/// List the clips currently belonging to a campaign.
pub async fn list_clips_by_campaign(pool: &SqlitePool, campaign_id: i64) -> Result<Vec<Clip>> {
    sqlx::query_as("SELECT * FROM clips WHERE campaign_id = ? ORDER BY id")
        .bind(campaign_id)
        .fetch_all(pool)
        .await
        .context("Failed to list clips for campaign")
}

// ========== Campaigns ==========

/// List every campaign known to the store.
pub async fn list_campaigns(pool: &SqlitePool) -> Result<Vec<Campaign>> {
    sqlx::query_as("SELECT * FROM campaigns ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list campaigns")
}

/// Get a campaign by id.
pub async fn get_campaign(pool: &SqlitePool, id: i64) -> Result<Option<Campaign>> {
    sqlx::query_as("SELECT * FROM campaigns WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch campaign")
}

/// Insert an externally-created campaign.
pub async fn insert_campaign(pool: &SqlitePool, campaign: &NewCampaign) -> Result<()> {
    let platforms = campaign
        .allowed_platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",");

    sqlx::query(
        r"
        INSERT INTO campaigns (id, name, rate, max_payout, allowed_platforms)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(campaign.id)
    .bind(&campaign.name)
    .bind(campaign.rate)
    .bind(campaign.max_payout)
    .bind(platforms)
    .execute(pool)
    .await
    .context("Failed to insert campaign")?;

    Ok(())
}

/// Persist recomputed campaign aggregates.
pub async fn update_campaign_totals(
    pool: &SqlitePool,
    id: i64,
    total_views: i64,
    total_likes: i64,
) -> Result<()> {
    sqlx::query("UPDATE campaigns SET total_views = ?, total_likes = ? WHERE id = ?")
        .bind(total_views)
        .bind(total_likes)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update campaign totals")?;

    Ok(())
}

/// Transition a campaign from ACTIVE to COMPLETED and create its payment
/// records in a single transaction.
///
/// Contributing clips are stamped with the payment that covers them. The
/// status guard in the UPDATE makes the transition at-most-once: a campaign
/// that is already COMPLETED (or PAUSED) leaves zero rows affected and the
/// whole transaction is rolled back with an error.
pub async fn complete_campaign_with_payments(
    pool: &SqlitePool,
    campaign_id: i64,
    end_date: &str,
    payments: &[NewPayment],
) -> Result<Vec<i64>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let updated = sqlx::query(
        r"
        UPDATE campaigns
        SET status = ?, end_date = ?
        WHERE id = ? AND status = ?
        ",
    )
    .bind(CampaignStatus::Completed.as_str())
    .bind(end_date)
    .bind(campaign_id)
    .bind(CampaignStatus::Active.as_str())
    .execute(&mut *tx)
    .await
    .context("Failed to complete campaign")?;

    if updated.rows_affected() != 1 {
        anyhow::bail!("campaign {campaign_id} is not ACTIVE; refusing to complete");
    }

    let mut payment_ids = Vec::with_capacity(payments.len());
    for payment in payments {
        let result = sqlx::query(
            r"
            INSERT INTO payments (user_id, campaign_id, amount, total_views, clip_count, status)
            VALUES (?, ?, ?, ?, ?, 'PENDING')
            ",
        )
        .bind(&payment.user_id)
        .bind(payment.campaign_id)
        .bind(payment.amount)
        .bind(payment.total_views)
        .bind(payment.clip_count)
        .execute(&mut *tx)
        .await
        .context("Failed to insert payment")?;

        let payment_id = result.last_insert_rowid();

        sqlx::query(
            r"
            UPDATE clips
            SET payment_id = ?
            WHERE campaign_id = ? AND user_id = ?
            ",
        )
        .bind(payment_id)
        .bind(campaign_id)
        .bind(&payment.user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to associate clips with payment")?;

        payment_ids.push(payment_id);
    }

    tx.commit()
        .await
        .context("Failed to commit campaign completion")?;

    Ok(payment_ids)
}

// ========== Payments ==========

/// Create a standalone payment record, returning its id.
pub async fn create_payment(pool: &SqlitePool, payment: &NewPayment) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO payments (user_id, campaign_id, amount, total_views, clip_count, status)
        VALUES (?, ?, ?, ?, ?, 'PENDING')
        ",
    )
    .bind(&payment.user_id)
    .bind(payment.campaign_id)
    .bind(payment.amount)
    .bind(payment.total_views)
    .bind(payment.clip_count)
    .execute(pool)
    .await
    .context("Failed to create payment")?;

    Ok(result.last_insert_rowid())
}

/// List the payments generated for a campaign.
pub async fn list_payments_by_campaign(
    pool: &SqlitePool,
    campaign_id: i64,
) -> Result<Vec<Payment>> {
    sqlx::query_as("SELECT * FROM payments WHERE campaign_id = ? ORDER BY id")
        .bind(campaign_id)
        .fetch_all(pool)
        .await
        .context("Failed to list payments for campaign")
}

// ========== Users ==========

/// Insert an externally-registered user.
pub async fn insert_user(pool: &SqlitePool, id: &str, payout_address: Option<&str>) -> Result<()> {
    sqlx::query("INSERT INTO users (id, payout_address) VALUES (?, ?)")
        .bind(id)
        .bind(payout_address)
        .execute(pool)
        .await
        .context("Failed to insert user")?;

    Ok(())
}
