use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{
    auth::{
        jwt::{SessionIdentity, TokenIssuer},
        repo_types::Role,
    },
    error::AppError,
    state::AppState,
};

/// Caller authenticated with a Bearer session token.
pub struct SessionUser(pub SessionIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    TokenIssuer: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::NotAuthorized("Missing Authorization header".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::NotAuthorized("Invalid Authorization header".into()))?;

        let issuer = TokenIssuer::from_ref(state);
        let identity = issuer.verify_session(token.trim()).map_err(|e| {
            warn!(error = %e, "session token rejected");
            AppError::from(e)
        })?;

        Ok(SessionUser(identity))
    }
}

/// Caller whose session token is valid and whose stored account is an active
/// admin. The stored record is checked on every request, so deactivation or
/// demotion takes effect before the token expires.
pub struct AdminUser(pub SessionIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let SessionUser(identity) = SessionUser::from_request_parts(parts, &app).await?;

        let stored = app
            .users
            .find_by_id(identity.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                warn!(user_id = %identity.user_id, "admin route denied: account missing or inactive");
                AppError::NotAuthorized("Account is disabled".into())
            })?;
        if stored.role != Role::Admin {
            warn!(user_id = %identity.user_id, "admin route denied");
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(identity))
    }
}
