use tracing::{info, warn};

use crate::{
    auth::{
        repo_types::Role,
        services::{create_account, normalize_email, NewAccount},
    },
    error::AppError,
    state::AppState,
};

/// First-run accounts: one admin and one test client. Existing emails are left
/// untouched, so this is safe on every start.
pub async fn bootstrap(state: &AppState) -> Result<(), AppError> {
    let seed = &state.config.seed;
    if !seed.enabled {
        return Ok(());
    }

    let accounts = [
        (&seed.admin_email, &seed.admin_password, "Admin", Role::Admin),
        (&seed.client_email, &seed.client_password, "ClientTest", Role::Client),
    ];

    for (email, password, username, role) in accounts {
        if state.users.find_by_email(&normalize_email(email)).await?.is_some() {
            continue;
        }
        let user = create_account(
            state.users.as_ref(),
            NewAccount {
                email,
                password,
                username: Some(username),
                role,
            },
        )
        .await?;
        info!(user_id = %user.id, email = %user.email, role = %role, "seeded account");
    }

    if seed.admin_password == "admin123" {
        warn!("seeded admin uses the default password; set SEED_ADMIN_PASSWORD");
    }
    Ok(())
}
