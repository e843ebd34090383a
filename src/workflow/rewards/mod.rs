//! Rewards and referral pages.

use tracing::warn;

use crate::interfaces::document_store::Query;
use crate::model::{Record, Reward, RewardStatus, User, REWARDS, USERS};
use crate::session::Session;
use crate::workflow::error::{Result, WorkflowError};
use crate::workflow::WorkflowContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RewardSort {
    /// Newest first.
    #[default]
    Date,
    /// Claimed before unclaimed, newest first within each.
    Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardQuery {
    /// Case-insensitive substring of the message.
    pub search: String,
    pub sort: RewardSort,
}

impl RewardQuery {
    /// Filter and order `rewards` in place.
    pub fn apply(&self, rewards: &mut Vec<Record<Reward>>) {
        let needle = self.search.to_lowercase();
        rewards.retain(|r| r.doc.message.to_lowercase().contains(&needle));
        rewards.sort_by(|a, b| b.doc.created_at.cmp(&a.doc.created_at));
        if self.sort == RewardSort::Status {
            rewards.sort_by_key(|r| status_label(r.doc.status));
        }
    }
}

fn status_label(status: RewardStatus) -> &'static str {
    match status {
        RewardStatus::Claimed => "claimed",
        RewardStatus::Unclaimed => "unclaimed",
    }
}

/// The signed-in user's referral id and the users who joined with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferralOverview {
    pub referral_id: String,
    pub referred: Vec<User>,
    pub reward_count: usize,
}

#[derive(Clone)]
pub struct RewardService {
    ctx: WorkflowContext,
}

impl RewardService {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    /// Rewards issued to the session's user.
    pub async fn rewards(&self, session: &Session, query: &RewardQuery) -> Result<Vec<Record<Reward>>> {
        let user_id = session.require_user()?;
        let docs = self
            .ctx
            .store
            .query(&Query::collection(REWARDS).where_eq("userId", user_id))
            .await?;
        let mut rewards = Record::decode_all(&docs)?;
        query.apply(&mut rewards);
        Ok(rewards)
    }

    /// Resolve the `referrals` array of the session's user.
    ///
    /// Referred users whose profile has since disappeared are skipped.
    pub async fn referrals(&self, session: &Session) -> Result<ReferralOverview> {
        let user_id = session.require_user()?;
        let user = self
            .ctx
            .load_user(user_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound {
                collection: USERS,
                id: user_id.to_string(),
            })?
            .doc;

        let mut referred = Vec::with_capacity(user.referrals.len());
        for id in &user.referrals {
            match self.ctx.load_user(id).await? {
                Some(record) => referred.push(record.doc),
                None => warn!(user_id = %user_id, referred_id = %id, "Referred user has no profile"),
            }
        }

        let reward_count = self.rewards(session, &RewardQuery::default()).await?.len();
        Ok(ReferralOverview {
            referral_id: user.referral_id,
            referred,
            reward_count,
        })
    }
}

#[cfg(test)]
mod tests;
