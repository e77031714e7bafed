use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse},
        services::{authenticate, register as register_account},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

fn required_pair(email: Option<String>, password: Option<String>) -> Result<(String, String), AppError> {
    match (email, password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => Ok((e, p)),
        _ => Err(AppError::InvalidInput("Email and password are required".into())),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, AppError> {
    let Json(payload) = payload?;
    let (email, password) = required_pair(payload.email, payload.password)?;

    let user = register_account(
        state.users.as_ref(),
        &email,
        &password,
        payload.username.as_deref(),
    )
    .await?;
    let qr_token = state.tokens.issue_qr(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(RegisterResponse {
        success: true,
        message: "Account created".into(),
        user_id: user.id,
        qr_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload?;
    let (email, password) = required_pair(payload.email, payload.password)?;

    let user = authenticate(state.users.as_ref(), &email, &password).await?;
    let visits = state.visits.count_visits(user.id).await?;
    let token = state.tokens.issue_session(&user)?;
    let qr_token = state.tokens.issue_qr(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        token,
        qr_token,
        user: PublicUser {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
            visits,
        },
    }))
}
