use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::repo_types::{Role, User},
    rewards::dto::{ProgressView, RewardView},
    visits::dto::VisitView,
};

#[derive(Debug, Serialize)]
pub struct DashboardUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl From<User> for DashboardUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub success: bool,
    pub user: DashboardUser,
    pub total_visits: i64,
    pub progress: ProgressView,
    pub visits: Vec<VisitView>,
    pub rewards: Vec<RewardView>,
}
