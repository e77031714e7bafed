use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RewardStore, StoreError, UserStore, VisitStore};
use crate::{
    auth::repo_types::{NewUser, User, UserPatch},
    rewards::repo_types::RewardGrant,
    visits::repo_types::{AppendOutcome, NewVisit, Visit, VisitSummary},
};

/// Process-local backend. Every mutation takes the single write guard, which
/// makes check-then-insert and append-then-count atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    visits: Vec<Visit>, // insertion order
    rewards: Vec<RewardGrant>,
}

impl Inner {
    fn user_mut(&mut self, id: Uuid) -> Result<&mut User, StoreError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound("user"))
    }

    fn count_for(&self, user_id: Uuid) -> i64 {
        self.visits.iter().filter(|v| v.user_id == user_id).count() as i64
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            username: new.username,
            role: new.role,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(id)?;
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        Ok(user.clone())
    }
}

#[async_trait]
impl VisitStore for MemoryStore {
    async fn append_visit(&self, new: NewVisit) -> Result<AppendOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.user_mut(new.user_id)?.is_active {
            return Err(StoreError::NotFound("user"));
        }

        if let Some(scan_id) = new.scan_id.as_deref() {
            let existing = inner
                .visits
                .iter()
                .find(|v| v.user_id == new.user_id && v.scan_id.as_deref() == Some(scan_id))
                .cloned();
            if let Some(visit) = existing {
                let total = inner.count_for(new.user_id);
                return Ok(AppendOutcome {
                    visit,
                    total,
                    duplicate: true,
                });
            }
        }

        let visit = Visit {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            visited_at: OffsetDateTime::now_utc(),
            note: new.note,
            scan_id: new.scan_id,
        };
        inner.visits.push(visit.clone());
        let total = inner.count_for(new.user_id);
        Ok(AppendOutcome {
            visit,
            total,
            duplicate: false,
        })
    }

    async fn list_visits(&self, user_id: Uuid, limit: i64) -> Result<Vec<Visit>, StoreError> {
        let inner = self.inner.read().await;
        // Reverse insertion order first; the stable sort keeps it for equal timestamps.
        let mut visits: Vec<Visit> = inner
            .visits
            .iter()
            .rev()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        visits.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        visits.truncate(limit.max(0) as usize);
        Ok(visits)
    }

    async fn count_visits(&self, user_id: Uuid) -> Result<i64, StoreError> {
        Ok(self.inner.read().await.count_for(user_id))
    }

    async fn total_visits(&self) -> Result<i64, StoreError> {
        Ok(self.inner.read().await.visits.len() as i64)
    }

    async fn visit_summaries(&self) -> Result<Vec<VisitSummary>, StoreError> {
        let inner = self.inner.read().await;
        let mut by_user: HashMap<Uuid, VisitSummary> = HashMap::new();
        for v in &inner.visits {
            let entry = by_user.entry(v.user_id).or_insert(VisitSummary {
                user_id: v.user_id,
                visits_count: 0,
                last_visit: None,
            });
            entry.visits_count += 1;
            entry.last_visit = entry.last_visit.max(Some(v.visited_at));
        }
        Ok(by_user.into_values().collect())
    }
}

#[async_trait]
impl RewardStore for MemoryStore {
    async fn grant_reward(
        &self,
        user_id: Uuid,
        cycle: i64,
        reward_name: &str,
    ) -> Result<Option<RewardGrant>, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .rewards
            .iter()
            .any(|r| r.user_id == user_id && r.cycle == cycle)
        {
            return Ok(None);
        }
        let grant = RewardGrant {
            id: Uuid::new_v4(),
            user_id,
            cycle,
            reward_name: reward_name.to_string(),
            granted_at: OffsetDateTime::now_utc(),
            claimed_at: None,
        };
        inner.rewards.push(grant.clone());
        Ok(Some(grant))
    }

    async fn list_rewards(&self, user_id: Uuid) -> Result<Vec<RewardGrant>, StoreError> {
        let inner = self.inner.read().await;
        let mut grants: Vec<RewardGrant> = inner
            .rewards
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        grants.sort_by_key(|r| std::cmp::Reverse(r.cycle));
        Ok(grants)
    }

    async fn find_reward(&self, id: Uuid) -> Result<Option<RewardGrant>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rewards.iter().find(|r| r.id == id).cloned())
    }

    async fn claim_reward(&self, id: Uuid) -> Result<RewardGrant, StoreError> {
        let mut inner = self.inner.write().await;
        let grant = inner
            .rewards
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound("reward"))?;
        if grant.claimed_at.is_none() {
            grant.claimed_at = Some(OffsetDateTime::now_utc());
        }
        Ok(grant.clone())
    }

    async fn count_rewards(&self) -> Result<i64, StoreError> {
        Ok(self.inner.read().await.rewards.len() as i64)
    }
}
