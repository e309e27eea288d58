use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::{ApiError, AuthFailure};
use crate::store::Database;

use super::Claims;

/// Identity attached to a request by [`require_auth`](super::require_auth).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: u64,
    pub is_admin: bool,
}

impl From<&Claims> for AuthContext {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id,
            is_admin: claims.is_admin,
        }
    }
}

impl AuthContext {
    /// Re-read the admin flag from the store.
    ///
    /// Admin claims are only as fresh as the token, so anything that grants
    /// admin powers goes through here. Non-admin claims are returned as-is.
    pub fn confirm_admin(self, db: &Database) -> Result<Self, ApiError> {
        if !self.is_admin {
            return Ok(self);
        }

        let user = db
            .find_user_by_id(self.user_id)?
            .ok_or(ApiError::Unauthorized(AuthFailure::TokenInvalid))?;

        if !user.is_admin {
            tracing::warn!(user_id = self.user_id, "Token carries a revoked admin flag");
        }

        Ok(Self {
            is_admin: user.is_admin,
            ..self
        })
    }

    /// True when the caller owns `owner_id` or is an admin.
    pub fn can_access(&self, owner_id: u64) -> bool {
        self.is_admin || self.user_id == owner_id
    }

    /// Owner filter for listing queries: admins see everything.
    pub fn owner_scope(&self) -> Option<u64> {
        if self.is_admin {
            None
        } else {
            Some(self.user_id)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(ApiError::Unauthorized(AuthFailure::MissingToken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn db_with(is_admin: bool) -> (Database, u64) {
        let db = Database::open(":memory:").unwrap();
        let user = db
            .create_user(&NewUser {
                name: "T".to_string(),
                email: "t@x.com".to_string(),
                password_hash: "hash".to_string(),
                is_admin,
            })
            .unwrap();
        (db, user.id)
    }

    #[test]
    fn test_confirm_admin_keeps_current_admin() {
        let (db, id) = db_with(true);
        let ctx = AuthContext { user_id: id, is_admin: true };
        assert!(ctx.confirm_admin(&db).unwrap().is_admin);
    }

    #[test]
    fn test_confirm_admin_drops_revoked_flag() {
        let (db, id) = db_with(false);
        let ctx = AuthContext { user_id: id, is_admin: true };
        assert!(!ctx.confirm_admin(&db).unwrap().is_admin);
    }

    #[test]
    fn test_confirm_admin_rejects_deleted_account() {
        let (db, id) = db_with(true);
        let ctx = AuthContext { user_id: id + 100, is_admin: true };
        assert!(matches!(
            ctx.confirm_admin(&db),
            Err(ApiError::Unauthorized(AuthFailure::TokenInvalid))
        ));
    }

    #[test]
    fn test_confirm_admin_skips_store_for_regular_users() {
        let (db, _) = db_with(false);
        let ctx = AuthContext { user_id: 999, is_admin: false };
        assert_eq!(ctx.confirm_admin(&db).unwrap(), ctx);
    }

    #[test]
    fn test_access_and_scope() {
        let user = AuthContext { user_id: 1, is_admin: false };
        let admin = AuthContext { user_id: 2, is_admin: true };

        assert!(user.can_access(1));
        assert!(!user.can_access(2));
        assert!(admin.can_access(1));
        assert_eq!(user.owner_scope(), Some(1));
        assert_eq!(admin.owner_scope(), None);
    }
}
