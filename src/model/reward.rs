use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reward type issued at referral signup.
pub const REFERRAL_REWARD_TYPE: &str = "Referral";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    #[default]
    Unclaimed,
    Claimed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub user_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: RewardStatus,
    #[serde(rename = "type")]
    pub kind: String,
    /// `CPN-` followed by six digits.
    pub coupon_number: String,
}
