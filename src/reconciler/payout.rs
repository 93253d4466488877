//! Payout partitioning.
//!
//! Pure computation: given a completed campaign's clips and its per-view
//! rate, split the spend into one pending payment per contributing user.

use std::collections::BTreeMap;

use crate::db::{Clip, NewPayment};

/// Round a currency amount to the cent.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Partition a campaign's clips by uploading user into payment records.
///
/// Each user's amount is their own contributed views times the campaign
/// rate, rounded to the cent. Output is ordered by user id so payment
/// creation is deterministic.
#[must_use]
pub fn partition_payouts(campaign_id: i64, rate: f64, clips: &[Clip]) -> Vec<NewPayment> {
    let mut per_user: BTreeMap<&str, (i64, i64)> = BTreeMap::new();

    for clip in clips {
        let entry = per_user.entry(clip.user_id.as_str()).or_insert((0, 0));
        entry.0 += clip.views;
        entry.1 += 1;
    }

    per_user
        .into_iter()
        .map(|(user_id, (total_views, clip_count))| NewPayment {
            user_id: user_id.to_string(),
            campaign_id,
            amount: round_cents(total_views as f64 * rate),
            total_views,
            clip_count,
        })
        .collect()
}
