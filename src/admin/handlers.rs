use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    admin::{
        dto::{AdminUsersResponse, ClaimRewardResponse, UpdateUserRequest, UpdateUserResponse},
        services::{admin_update_user, admin_user_list, claim_reward},
    },
    auth::{extractors::AdminUser, repo_types::UserPatch},
    error::AppError,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:id", patch(update_user))
        .route("/api/admin/rewards/:id/claim", post(claim))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<AdminUsersResponse>, AppError> {
    let (entries, stats) = admin_user_list(&state).await?;
    Ok(Json(AdminUsersResponse {
        success: true,
        users: entries.into_iter().map(Into::into).collect(),
        stats: stats.into(),
    }))
}

#[instrument(skip(state, admin, id, payload), fields(admin_id = %admin.0.user_id))]
pub async fn update_user(
    State(state): State<AppState>,
    admin: AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UpdateUserResponse>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let AdminUser(caller) = admin;
    let user = admin_update_user(
        &caller,
        &state,
        id,
        UserPatch {
            is_active: payload.is_active,
            role: payload.role,
        },
    )
    .await?;
    Ok(Json(UpdateUserResponse {
        success: true,
        user: user.into(),
    }))
}

#[instrument(skip(state, admin, id), fields(admin_id = %admin.0.user_id))]
pub async fn claim(
    State(state): State<AppState>,
    admin: AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ClaimRewardResponse>, AppError> {
    let Path(id) = id?;
    let grant = claim_reward(&state, id).await?;
    Ok(Json(ClaimRewardResponse {
        success: true,
        reward: grant.into(),
    }))
}
