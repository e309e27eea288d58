//! Default administrator account.

use crate::auth::{PasswordError, PasswordHasher};
use crate::config::BootstrapConfig;
use crate::models::NewUser;
use crate::store::{Database, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created { user_id: u64 },
    AlreadyPresent,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Create the configured admin unless an account with that email exists.
///
/// Safe to run on every start. An existing account is left untouched, even
/// if it has since lost its admin flag or changed password.
pub async fn ensure_default_admin(
    db: &Database,
    hasher: &PasswordHasher,
    settings: &BootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    if db.count_users_by_email(&settings.admin_email, None)? > 0 {
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    let password_hash = hasher.hash(settings.admin_password.clone()).await?;
    let new_admin = NewUser {
        name: settings.admin_name.clone(),
        email: settings.admin_email.clone(),
        password_hash,
        is_admin: true,
    };

    match db.create_user(&new_admin) {
        Ok(user) => Ok(BootstrapOutcome::Created { user_id: user.id }),
        // Another instance won the race.
        Err(StoreError::DuplicateEmail) => Ok(BootstrapOutcome::AlreadyPresent),
        Err(e) => Err(e.into()),
    }
}
