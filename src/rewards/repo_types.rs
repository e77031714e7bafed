use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A reward earned by completing one visit cycle.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RewardGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cycle: i64,
    pub reward_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub granted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub claimed_at: Option<OffsetDateTime>,
}

impl RewardGrant {
    pub fn is_claimed(&self) -> bool {
        self.claimed_at.is_some()
    }
}
