use std::sync::Arc;

use tracing::info;

use crate::{
    auth::jwt::TokenIssuer,
    config::{AppConfig, StoreBackend},
    store::{memory::MemoryStore, postgres::PgStore, RewardStore, UserStore, VisitStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenIssuer,
    pub users: Arc<dyn UserStore>,
    pub visits: Arc<dyn VisitStore>,
    pub rewards: Arc<dyn RewardStore>,
}

impl AppState {
    /// Builds the state with the backend selected in `config`.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;
                let store = Arc::new(PgStore::connect(&url).await?);
                info!("using postgres store");
                Ok(Self::from_parts(config, store.clone(), store.clone(), store))
            }
            StoreBackend::Memory => {
                info!("using in-memory store; data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::default());
        Self::from_parts(config, store.clone(), store.clone(), store)
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        visits: Arc<dyn VisitStore>,
        rewards: Arc<dyn RewardStore>,
    ) -> Self {
        Self {
            tokens: TokenIssuer::new(&config.jwt),
            config: Arc::new(config),
            users,
            visits,
            rewards,
        }
    }
}
