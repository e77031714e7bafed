use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::extractors::SessionUser,
    dashboard::{dto::DashboardResponse, services::dashboard_for},
    error::AppError,
    rewards::dto::ProgressView,
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}

#[instrument(skip(state, session), fields(user_id = %session.0.user_id))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    session: SessionUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let SessionUser(identity) = session;
    let dashboard = dashboard_for(&state, identity.user_id).await?;

    Ok(Json(DashboardResponse {
        success: true,
        progress: ProgressView::new(&dashboard.progress, &state.config.reward),
        total_visits: dashboard.total_visits,
        user: dashboard.user.into(),
        visits: dashboard.recent_visits.into_iter().map(Into::into).collect(),
        rewards: dashboard.rewards.into_iter().map(Into::into).collect(),
    }))
}
