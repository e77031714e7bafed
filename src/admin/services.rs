use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::SessionIdentity,
        repo_types::{User, UserPatch},
        services::update_user,
    },
    config::RewardMode,
    error::AppError,
    rewards::{evaluator::completed_cycles, repo_types::RewardGrant},
    state::AppState,
};

#[derive(Debug)]
pub struct AdminUserEntry {
    pub user: User,
    pub visits_count: i64,
    pub last_visit: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetStats {
    pub total_users: i64,
    pub total_visits: i64,
    pub active_users: i64,
    pub rewards_given: i64,
}

/// Every user with their visit count, plus fleet-wide totals.
///
/// In stateless reward mode `rewards_given` is `total_visits / required`
/// across all users, an approximation that can count rewards nobody has
/// earned individually. Persisted mode counts actual grants.
pub async fn admin_user_list(state: &AppState) -> Result<(Vec<AdminUserEntry>, FleetStats), AppError> {
    let users = state.users.list_users().await?;
    let mut summaries: HashMap<Uuid, _> = state
        .visits
        .visit_summaries()
        .await?
        .into_iter()
        .map(|s| (s.user_id, s))
        .collect();
    let total_visits = state.visits.total_visits().await?;

    let policy = &state.config.reward;
    let rewards_given = match policy.mode {
        RewardMode::Stateless => completed_cycles(total_visits, policy.required_visits),
        RewardMode::Persisted => state.rewards.count_rewards().await?,
    };

    let stats = FleetStats {
        total_users: users.len() as i64,
        total_visits,
        active_users: users.iter().filter(|u| u.is_active).count() as i64,
        rewards_given,
    };

    let entries = users
        .into_iter()
        .map(|user| {
            let summary = summaries.remove(&user.id);
            AdminUserEntry {
                visits_count: summary.as_ref().map_or(0, |s| s.visits_count),
                last_visit: summary.and_then(|s| s.last_visit),
                user,
            }
        })
        .collect();

    Ok((entries, stats))
}

/// Admin edit of another account's active flag and/or role.
pub async fn admin_update_user(
    caller: &SessionIdentity,
    state: &AppState,
    user_id: Uuid,
    patch: UserPatch,
) -> Result<User, AppError> {
    if patch.is_active.is_none() && patch.role.is_none() {
        return Err(AppError::InvalidInput("Nothing to update".into()));
    }
    if caller.user_id == user_id {
        warn!(user_id = %user_id, "admin tried to modify own account");
        return Err(AppError::InvalidInput("Admins cannot modify their own account".into()));
    }
    update_user(state.users.as_ref(), user_id, patch).await
}

pub async fn claim_reward(state: &AppState, reward_id: Uuid) -> Result<RewardGrant, AppError> {
    let grant = state
        .rewards
        .find_reward(reward_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Reward not found".into()))?;
    if grant.is_claimed() {
        return Err(AppError::InvalidInput("Reward already claimed".into()));
    }
    let claimed = state.rewards.claim_reward(reward_id).await?;
    info!(reward_id = %claimed.id, user_id = %claimed.user_id, "reward claimed");
    Ok(claimed)
}
