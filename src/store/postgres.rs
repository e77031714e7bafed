use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;
use uuid::Uuid;

use super::{RewardStore, StoreError, UserStore, VisitStore};
use crate::{
    auth::repo_types::{NewUser, User, UserPatch, UserRow},
    rewards::repo_types::RewardGrant,
    visits::repo_types::{AppendOutcome, NewVisit, Visit, VisitSummary},
};

const USER_COLUMNS: &str = "id, email, password_hash, username, role, is_active, created_at";
const VISIT_COLUMNS: &str = "id, user_id, visited_at, note, scan_id";
const REWARD_COLUMNS: &str = "id, user_id, cycle, reward_name, granted_at, claimed_at";

/// PostgreSQL backend over a shared pool.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self { db })
    }
}

fn to_user(row: UserRow) -> Result<User, StoreError> {
    User::try_from(row).map_err(StoreError::Backend)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, username, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.username)
        .bind(new.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::from(other),
        })?;
        to_user(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(to_user).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(to_user).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(to_user).collect()
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET is_active = COALESCE($2, is_active),
                   role = COALESCE($3, role)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.is_active)
        .bind(patch.role.map(|r| r.as_str()))
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound("user"))?;
        to_user(row)
    }
}

#[async_trait]
impl VisitStore for PgStore {
    async fn append_visit(&self, new: NewVisit) -> Result<AppendOutcome, StoreError> {
        let mut tx = self.db.begin().await.context("begin append_visit")?;

        // Row lock on the owner serializes appends for the same user and holds
        // off a concurrent deactivation until the visit is committed.
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 AND is_active FOR UPDATE")
            .bind(new.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound("user"));
        }

        let existing = match new.scan_id.as_deref() {
            Some(scan_id) => {
                sqlx::query_as::<_, Visit>(&format!(
                    "SELECT {VISIT_COLUMNS} FROM visits WHERE user_id = $1 AND scan_id = $2"
                ))
                .bind(new.user_id)
                .bind(scan_id)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };

        let (visit, duplicate) = match existing {
            Some(visit) => (visit, true),
            None => {
                let visit = sqlx::query_as::<_, Visit>(&format!(
                    r#"
                    INSERT INTO visits (id, user_id, note, scan_id)
                    VALUES ($1, $2, $3, $4)
                    RETURNING {VISIT_COLUMNS}
                    "#
                ))
                .bind(Uuid::new_v4())
                .bind(new.user_id)
                .bind(&new.note)
                .bind(&new.scan_id)
                .fetch_one(&mut *tx)
                .await?;
                (visit, false)
            }
        };

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits WHERE user_id = $1")
            .bind(new.user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await.context("commit append_visit")?;
        Ok(AppendOutcome {
            visit,
            total,
            duplicate,
        })
    }

    async fn list_visits(&self, user_id: Uuid, limit: i64) -> Result<Vec<Visit>, StoreError> {
        let rows = sqlx::query_as::<_, Visit>(&format!(
            r#"
            SELECT {VISIT_COLUMNS}
              FROM visits
             WHERE user_id = $1
             ORDER BY visited_at DESC, seq DESC
             LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit.max(0))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count_visits(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn total_visits(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn visit_summaries(&self) -> Result<Vec<VisitSummary>, StoreError> {
        let rows = sqlx::query_as::<_, VisitSummary>(
            r#"
            SELECT user_id, COUNT(*) AS visits_count, MAX(visited_at) AS last_visit
              FROM visits
             GROUP BY user_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl RewardStore for PgStore {
    async fn grant_reward(
        &self,
        user_id: Uuid,
        cycle: i64,
        reward_name: &str,
    ) -> Result<Option<RewardGrant>, StoreError> {
        let grant = sqlx::query_as::<_, RewardGrant>(&format!(
            r#"
            INSERT INTO reward_grants (id, user_id, cycle, reward_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, cycle) DO NOTHING
            RETURNING {REWARD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(cycle)
        .bind(reward_name)
        .fetch_optional(&self.db)
        .await?;
        Ok(grant)
    }

    async fn list_rewards(&self, user_id: Uuid) -> Result<Vec<RewardGrant>, StoreError> {
        let rows = sqlx::query_as::<_, RewardGrant>(&format!(
            "SELECT {REWARD_COLUMNS} FROM reward_grants WHERE user_id = $1 ORDER BY cycle DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_reward(&self, id: Uuid) -> Result<Option<RewardGrant>, StoreError> {
        let row = sqlx::query_as::<_, RewardGrant>(&format!(
            "SELECT {REWARD_COLUMNS} FROM reward_grants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn claim_reward(&self, id: Uuid) -> Result<RewardGrant, StoreError> {
        let row = sqlx::query_as::<_, RewardGrant>(&format!(
            r#"
            UPDATE reward_grants
               SET claimed_at = COALESCE(claimed_at, now())
             WHERE id = $1
            RETURNING {REWARD_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound("reward"))?;
        Ok(row)
    }

    async fn count_rewards(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reward_grants")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
