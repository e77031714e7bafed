use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    admin::services::{AdminUserEntry, FleetStats},
    auth::repo_types::{Role, User},
    rewards::dto::RewardView,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub visits_count: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_visit: Option<OffsetDateTime>,
}

impl From<AdminUserEntry> for AdminUserView {
    fn from(e: AdminUserEntry) -> Self {
        Self {
            id: e.user.id,
            email: e.user.email,
            username: e.user.username,
            role: e.user.role,
            is_active: e.user.is_active,
            visits_count: e.visits_count,
            last_visit: e.last_visit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_users: i64,
    pub total_visits: i64,
    pub active_users: i64,
    pub rewards_given: i64,
}

impl From<FleetStats> for StatsView {
    fn from(s: FleetStats) -> Self {
        Self {
            total_users: s.total_users,
            total_visits: s.total_visits,
            active_users: s.active_users,
            rewards_given: s.rewards_given,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminUsersResponse {
    pub success: bool,
    pub users: Vec<AdminUserView>,
    pub stats: StatsView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateUserResponse {
    pub success: bool,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct ClaimRewardResponse {
    pub success: bool,
    pub reward: RewardView,
}
