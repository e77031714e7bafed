use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    config::{RewardConfig, RewardMode},
    error::AppError,
    rewards::evaluator::{completed_cycles, evaluate, RewardProgress},
    state::AppState,
    store::{StoreError, VisitStore},
    visits::repo_types::{NewVisit, Visit},
};

const MAX_SCAN_ID_LEN: usize = 128;
const MAX_NOTE_LEN: usize = 500;

#[derive(Debug, Clone)]
pub struct ScanInput {
    pub qr_token: String,
    pub scan_id: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub user: User,
    pub visit: Visit,
    pub total: i64,
    pub progress: RewardProgress,
    pub reward: Option<String>,
    pub duplicate: bool,
}

pub fn reward_message(policy: &RewardConfig) -> String {
    format!("{} earned!", policy.name)
}

fn clean(field: Option<String>, max: usize, name: &str) -> Result<Option<String>, AppError> {
    let Some(value) = field.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(AppError::InvalidInput(format!("{name} is too long")));
    }
    Ok(Some(value))
}

/// Records one visit for the holder of `qr_token`.
pub async fn record_visit(state: &AppState, input: ScanInput) -> Result<ScanOutcome, AppError> {
    let scan_id = clean(input.scan_id, MAX_SCAN_ID_LEN, "scanId")?;
    let note = clean(input.note, MAX_NOTE_LEN, "note")?;

    let identity = state.tokens.verify_qr(&input.qr_token).map_err(|e| {
        warn!(error = %e, "qr token rejected");
        AppError::InvalidQr
    })?;

    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            warn!(user_id = %identity.user_id, "scan for unknown or inactive user");
            AppError::NotFound("User not found".into())
        })?;

    let appended = state
        .visits
        .append_visit(NewVisit {
            user_id: user.id,
            note,
            scan_id,
        })
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => {
                warn!(user_id = %user.id, "user deactivated before visit was recorded");
                AppError::NotFound("User not found".into())
            }
            other => other.into(),
        })?;

    let policy = &state.config.reward;
    let progress = evaluate(appended.total, policy.required_visits);
    let reward = match policy.mode {
        RewardMode::Stateless if progress.just_unlocked && !appended.duplicate => {
            Some(reward_message(policy))
        }
        RewardMode::Stateless => None,
        RewardMode::Persisted => {
            let granted = grant_missing_rewards(state, user.id, appended.total).await?;
            (granted > 0).then(|| reward_message(policy))
        }
    };

    info!(
        user_id = %user.id,
        visit_id = %appended.visit.id,
        total = appended.total,
        duplicate = appended.duplicate,
        rewarded = reward.is_some(),
        "visit recorded"
    );

    Ok(ScanOutcome {
        user,
        visit: appended.visit,
        total: appended.total,
        progress,
        reward,
        duplicate: appended.duplicate,
    })
}

/// Creates the grant for every completed cycle that has none yet and returns
/// how many were created. Running it on every scan, duplicates included, means
/// a grant that failed after its visit was stored is created on the next scan.
async fn grant_missing_rewards(state: &AppState, user_id: Uuid, total: i64) -> Result<usize, AppError> {
    let policy = &state.config.reward;
    let completed = completed_cycles(total, policy.required_visits);
    if completed == 0 {
        return Ok(0);
    }

    let existing: HashSet<i64> = state
        .rewards
        .list_rewards(user_id)
        .await?
        .into_iter()
        .map(|g| g.cycle)
        .collect();

    let mut granted = 0;
    for cycle in (1..=completed).filter(|c| !existing.contains(c)) {
        if let Some(grant) = state.rewards.grant_reward(user_id, cycle, &policy.name).await? {
            info!(user_id = %user_id, reward_id = %grant.id, cycle, "reward granted");
            granted += 1;
        }
    }
    Ok(granted)
}

pub async fn list_visits(visits: &dyn VisitStore, user_id: Uuid, limit: i64) -> Result<Vec<Visit>, AppError> {
    Ok(visits.list_visits(user_id, limit).await?)
}

pub async fn count_visits(visits: &dyn VisitStore, user_id: Uuid) -> Result<i64, AppError> {
    Ok(visits.count_visits(user_id).await?)
}
