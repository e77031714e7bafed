use loyalty::{
    app::{build_app, serve},
    config::AppConfig,
    seed,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "loyalty=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        store = ?config.store,
        reward_mode = ?config.reward.mode,
        required_visits = config.reward.required_visits,
        "configuration loaded"
    );

    let state = AppState::init(config).await?;
    if let Err(e) = seed::bootstrap(&state).await {
        tracing::warn!(error = %e, "seeding demo accounts failed; continuing");
    }

    let config = state.config.clone();
    serve(build_app(state), &config).await
}
