use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{config::RewardConfig, rewards::evaluator::RewardProgress, rewards::repo_types::RewardGrant};

/// Progress block shown after a scan and on the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub current: i64,
    pub total: i64,
    pub next_reward: String,
    pub percentage: f64,
}

impl ProgressView {
    pub fn new(progress: &RewardProgress, policy: &RewardConfig) -> Self {
        Self {
            current: progress.current_in_cycle,
            total: progress.required_visits,
            next_reward: policy.name.clone(),
            percentage: progress.percentage,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardView {
    pub id: Uuid,
    pub cycle: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub granted_at: OffsetDateTime,
    pub claimed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub claimed_at: Option<OffsetDateTime>,
}

impl From<RewardGrant> for RewardView {
    fn from(g: RewardGrant) -> Self {
        Self {
            claimed: g.is_claimed(),
            id: g.id,
            cycle: g.cycle,
            name: g.reward_name,
            granted_at: g.granted_at,
            claimed_at: g.claimed_at,
        }
    }
}
