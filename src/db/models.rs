use serde::{Deserialize, Serialize};

/// A supported content platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Instagram,
    TikTok,
    YouTube,
    X,
}

impl Platform {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "INSTAGRAM",
            Self::TikTok => "TIKTOK",
            Self::YouTube => "YOUTUBE",
            Self::X => "X",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "INSTAGRAM" => Some(Self::Instagram),
            "TIKTOK" => Some(Self::TikTok),
            "YOUTUBE" => Some(Self::YouTube),
            "X" => Some(Self::X),
            _ => None,
        }
    }
}

/// Campaign lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "PAUSED" => Some(Self::Paused),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Payment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
        }
    }
}

/// A tracked unit of externally-hosted content submitted against a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Clip {
    pub id: i64,
    pub url: String,
    pub platform: String,
    pub views: i64,
    pub likes: i64,
    pub last_metadata_update: Option<String>,
    pub consecutive_errors: i64,
    pub campaign_id: i64,
    pub user_id: String,
    pub payment_id: Option<i64>,
    pub created_at: String,
}

/// Fields for a newly submitted clip.
#[derive(Debug, Clone)]
pub struct NewClip {
    pub url: String,
    pub platform: Platform,
    pub campaign_id: i64,
    pub user_id: String,
}

/// A budgeted promotion with a per-view rate and a total spending cap.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub rate: f64,
    pub max_payout: f64,
    pub total_views: i64,
    pub total_likes: i64,
    pub status: String,
    pub allowed_platforms: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Fields for a newly created campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub id: i64,
    pub name: String,
    pub rate: f64,
    pub max_payout: f64,
    pub allowed_platforms: Vec<Platform>,
}

/// A participant who uploads clips and receives payouts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub payout_address: Option<String>,
    pub balance: f64,
    pub created_at: String,
}

/// A payout owed to a user for a completed campaign.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: String,
    pub campaign_id: i64,
    pub amount: f64,
    pub total_views: i64,
    pub clip_count: i64,
    pub status: String,
    pub payment_method: Option<String>,
    pub created_by: Option<String>,
    pub paid_by: Option<String>,
    pub paid_at: Option<String>,
    pub created_at: String,
}

/// Fields for a payment record at creation time.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: String,
    pub campaign_id: i64,
    pub amount: f64,
    pub total_views: i64,
    pub clip_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trip() {
        for p in [
            Platform::Instagram,
            Platform::TikTok,
            Platform::YouTube,
            Platform::X,
        ] {
            assert_eq!(Platform::from_str(p.as_str()), Some(p));
        }
        assert_eq!(Platform::from_str("MYSPACE"), None);
    }

    #[test]
    fn test_campaign_status_round_trip() {
        for s in [
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
        ] {
            assert_eq!(CampaignStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(CampaignStatus::from_str("active"), None);
    }
}
