use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::{burn_verification, hash_password, verify_password},
        repo_types::{NewUser, Role, User, UserPatch},
    },
    error::AppError,
    store::UserStore,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub username: Option<&'a str>,
    pub role: Role,
}

/// Creates an account. Public registration always passes `Role::Client`; the
/// admin role is only used by bootstrap seeding.
pub async fn create_account(users: &dyn UserStore, account: NewAccount<'_>) -> Result<User, AppError> {
    let email = normalize_email(account.email);
    if email.is_empty() || account.password.is_empty() {
        return Err(AppError::InvalidInput("Email and password are required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::InvalidInput("Invalid email".into()));
    }

    // Fast path; the store enforces uniqueness again on insert.
    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let username = account
        .username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let password_hash = hash_password(account.password)?;
    let user = users
        .insert_user(NewUser {
            email,
            password_hash: Some(password_hash),
            username,
            role: account.role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "account created");
    Ok(user)
}

pub async fn register(
    users: &dyn UserStore,
    email: &str,
    password: &str,
    username: Option<&str>,
) -> Result<User, AppError> {
    create_account(
        users,
        NewAccount {
            email,
            password,
            username,
            role: Role::Client,
        },
    )
    .await
}

/// Checks credentials of an active account.
///
/// Every failure path performs exactly one Argon2 verification and returns
/// the same error, so neither timing nor message tells whether the email is
/// registered or deactivated.
pub async fn authenticate(users: &dyn UserStore, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    let user = users.find_by_email(&email).await?;

    let candidate = user.filter(|u| u.is_active);
    let Some(user) = candidate else {
        burn_verification(password);
        warn!(email = %email, "login unknown or inactive account");
        return Err(AppError::InvalidCredentials);
    };

    let ok = match user.password_hash.as_deref() {
        Some(hash) => verify_password(password, hash)?,
        None => {
            burn_verification(password);
            false
        }
    };
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user authenticated");
    Ok(user)
}

/// Applies an admin patch. Writes nothing when the user is already in the
/// requested state.
pub async fn update_user(users: &dyn UserStore, user_id: Uuid, patch: UserPatch) -> Result<User, AppError> {
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if patch.is_noop_for(&user) {
        return Ok(user);
    }
    let updated = users.update_user(user_id, patch).await?;
    info!(
        user_id = %updated.id,
        is_active = updated.is_active,
        role = %updated.role,
        "user updated"
    );
    Ok(updated)
}

#[cfg(test)]
pub async fn set_active(users: &dyn UserStore, user_id: Uuid, active: bool) -> Result<User, AppError> {
    update_user(
        users,
        user_id,
        UserPatch {
            is_active: Some(active),
            role: None,
        },
    )
    .await
}

#[cfg(test)]
pub async fn set_role(users: &dyn UserStore, user_id: Uuid, role: Role) -> Result<User, AppError> {
    update_user(
        users,
        user_id,
        UserPatch {
            is_active: None,
            role: Some(role),
        },
    )
    .await
}
