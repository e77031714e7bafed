//! Persistence seams. Business logic only sees these traits; `AppState`
//! carries them as `Arc<dyn …>` and the backend is picked at startup.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User, UserPatch},
    rewards::repo_types::RewardGrant,
    visits::repo_types::{AppendOutcome, NewVisit, Visit, VisitSummary},
};

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(anyhow::Error::new(err))
    }
}

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `DuplicateEmail` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError>;
}

/// Append-only visit ledger.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Appends a visit and returns the user's new total. Appends for one user
    /// are serialized, and a repeated `scan_id` returns the existing visit
    /// without appending. `NotFound` if the user is missing or inactive.
    async fn append_visit(&self, visit: NewVisit) -> Result<AppendOutcome, StoreError>;
    /// Newest first; ties keep the later insert first.
    async fn list_visits(&self, user_id: Uuid, limit: i64) -> Result<Vec<Visit>, StoreError>;
    async fn count_visits(&self, user_id: Uuid) -> Result<i64, StoreError>;
    async fn total_visits(&self) -> Result<i64, StoreError>;
    /// Per-user count and latest visit, only for users that have visits.
    async fn visit_summaries(&self) -> Result<Vec<VisitSummary>, StoreError>;
}

/// Reward grants for the persisted reward mode.
#[async_trait]
pub trait RewardStore: Send + Sync {
    /// Records the grant for `(user_id, cycle)`. Returns `None` if it exists.
    async fn grant_reward(
        &self,
        user_id: Uuid,
        cycle: i64,
        reward_name: &str,
    ) -> Result<Option<RewardGrant>, StoreError>;
    async fn list_rewards(&self, user_id: Uuid) -> Result<Vec<RewardGrant>, StoreError>;
    async fn find_reward(&self, id: Uuid) -> Result<Option<RewardGrant>, StoreError>;
    /// Sets `claimed_at` if unset and returns the grant.
    async fn claim_reward(&self, id: Uuid) -> Result<RewardGrant, StoreError>;
    async fn count_rewards(&self) -> Result<i64, StoreError>;
}
