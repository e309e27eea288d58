//! Who may change which account.

use crate::models::User;

use super::AuthContext;

/// Reasons an account update is refused. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UpdateDenied {
    #[error("You can only modify your own account")]
    NotOwner,
    #[error("An admin cannot modify another admin")]
    PeerAdmin,
    #[error("Only an admin can change admin privileges")]
    AdminFlagRequiresAdmin,
}

/// Decide whether `actor` may update `target`.
///
/// `changes_admin_flag` is true whenever the request carries an admin flag at
/// all, even one equal to the stored value. Email uniqueness is checked by
/// the caller against the store afterwards.
pub fn check_user_update(
    actor: &AuthContext,
    target: &User,
    changes_admin_flag: bool,
) -> Result<(), UpdateDenied> {
    let is_self = actor.user_id == target.id;

    if !actor.is_admin && !is_self {
        return Err(UpdateDenied::NotOwner);
    }
    if actor.is_admin && target.is_admin && !is_self {
        return Err(UpdateDenied::PeerAdmin);
    }
    if changes_admin_flag && !actor.is_admin {
        return Err(UpdateDenied::AdminFlagRequiresAdmin);
    }
    Ok(())
}
