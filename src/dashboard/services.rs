use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::AppError,
    rewards::{evaluator::evaluate, evaluator::RewardProgress, repo_types::RewardGrant},
    state::AppState,
    visits::{
        repo_types::Visit,
        services::{count_visits, list_visits},
    },
};

pub const RECENT_VISITS_LIMIT: i64 = 10;

/// Read model behind the client dashboard.
#[derive(Debug)]
pub struct Dashboard {
    pub user: User,
    pub total_visits: i64,
    pub progress: RewardProgress,
    pub recent_visits: Vec<Visit>,
    pub rewards: Vec<RewardGrant>,
}

pub async fn dashboard_for(state: &AppState, user_id: Uuid) -> Result<Dashboard, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let total_visits = count_visits(state.visits.as_ref(), user.id).await?;
    let recent_visits = list_visits(state.visits.as_ref(), user.id, RECENT_VISITS_LIMIT).await?;
    let rewards = state.rewards.list_rewards(user.id).await?;
    let progress = evaluate(total_visits, state.config.reward.required_visits);

    Ok(Dashboard {
        user,
        total_visits,
        progress,
        recent_visits,
        rewards,
    })
}
