use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_days: i64,
    pub qr_ttl_days: i64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => anyhow::bail!("unknown STORE_BACKEND '{other}'"),
        }
    }
}

/// How "reward unlocked" is decided at scan time.
///
/// `Stateless` recomputes `total % required == 0` on every scan. `Persisted`
/// records one grant per completed cycle and only reports a reward when that
/// grant is new, so grants can later be claimed.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RewardMode {
    Stateless,
    Persisted,
}

impl FromStr for RewardMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stateless" => Ok(Self::Stateless),
            "persisted" => Ok(Self::Persisted),
            other => anyhow::bail!("unknown REWARD_MODE '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardConfig {
    pub name: String,
    pub required_visits: i64,
    pub mode: RewardMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub enabled: bool,
    pub admin_email: String,
    pub admin_password: String,
    pub client_email: String,
    pub client_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub reward: RewardConfig,
    pub seed: SeedConfig,
    pub allowed_origin: Option<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Defaults for everything except the signing secret. Backed by memory.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            store: StoreBackend::Memory,
            database_url: None,
            jwt: JwtConfig {
                secret: secret.into(),
                issuer: "loyalty".into(),
                audience: "loyalty-clients".into(),
                session_ttl_days: 7,
                qr_ttl_days: 365,
            },
            reward: RewardConfig {
                name: "Free haircut".into(),
                required_visits: 5,
                mode: RewardMode::Stateless,
            },
            seed: SeedConfig {
                enabled: false,
                admin_email: "admin@barbershop.com".into(),
                admin_password: "admin123".into(),
                client_email: "client@test.com".into(),
                client_password: "test123".into(),
            },
            allowed_origin: None,
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::with_secret(std::env::var("JWT_SECRET").context("JWT_SECRET")?);

        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let store = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) if database_url.is_some() => StoreBackend::Postgres,
            Err(_) => StoreBackend::Memory,
        };
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("STORE_BACKEND=postgres requires DATABASE_URL");
        }

        let jwt = JwtConfig {
            secret: defaults.jwt.secret,
            issuer: env_or("JWT_ISSUER", defaults.jwt.issuer),
            audience: env_or("JWT_AUDIENCE", defaults.jwt.audience),
            session_ttl_days: env_parse("SESSION_TTL_DAYS", defaults.jwt.session_ttl_days)?,
            qr_ttl_days: env_parse("QR_TTL_DAYS", defaults.jwt.qr_ttl_days)?,
        };

        let reward = RewardConfig {
            name: env_or("REWARD_NAME", defaults.reward.name),
            required_visits: env_parse("REWARD_REQUIRED_VISITS", defaults.reward.required_visits)?,
            mode: match std::env::var("REWARD_MODE") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.reward.mode,
            },
        };
        if reward.required_visits < 1 {
            anyhow::bail!("REWARD_REQUIRED_VISITS must be at least 1");
        }

        let seed = SeedConfig {
            enabled: env_flag("SEED_DEMO_ACCOUNTS", true)?,
            admin_email: env_or("SEED_ADMIN_EMAIL", defaults.seed.admin_email),
            admin_password: env_or("SEED_ADMIN_PASSWORD", defaults.seed.admin_password),
            client_email: env_or("SEED_CLIENT_EMAIL", defaults.seed.client_email),
            client_password: env_or("SEED_CLIENT_PASSWORD", defaults.seed.client_password),
        };

        Ok(Self {
            store,
            database_url,
            jwt,
            reward,
            seed,
            allowed_origin: std::env::var("ALLOWED_ORIGIN").ok().filter(|v| !v.is_empty()),
            host: env_or("APP_HOST", defaults.host),
            port: env_parse("APP_PORT", defaults.port)?,
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn env_flag(key: &str, default: bool) -> anyhow::Result<bool> {
    parse_flag(key, std::env::var(key).ok(), default)
}

/// Unset or empty keeps the default; anything else must parse.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={v:?}: {e}")),
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> anyhow::Result<bool> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("invalid {key}={other:?}: expected true or false"),
    }
}
