//! Account endpoints. Every route here sits behind `require_auth`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use travelmate_common::{Trip, UpdateUserRequest, UpdateUserResponse, UserProfile};

use crate::auth::{check_user_update, require_admin, AuthContext};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::routes::parse_id;
use crate::validation::{validate_email, validate_name, validate_password};
use crate::AppState;

/// GET /me - The caller's own profile
async fn me(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> ApiResult<Json<UserProfile>> {
    let user = state
        .db
        .find_user_by_id(ctx.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user.profile()))
}

/// GET /users - All accounts (admin only)
async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = state.db.list_users()?;
    Ok(Json(users.iter().map(|u| u.profile()).collect()))
}

#[derive(Debug, Deserialize)]
struct EmailQuery {
    email: Option<String>,
}

/// GET /user?email= - Look up an account by email
///
/// Non-admins may only look themselves up, and get 403 for any other address
/// whether or not it is registered.
async fn find_by_email(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<UserProfile>> {
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Query parameter 'email' is required".to_string()))?;

    let ctx = ctx.confirm_admin(&state.db)?;
    match state.db.find_user_by_email(email)? {
        Some(user) if ctx.can_access(user.id) => Ok(Json(user.profile())),
        _ if !ctx.is_admin => Err(ApiError::Forbidden(
            "You can only look up your own account".to_string(),
        )),
        _ => Err(ApiError::NotFound("User not found".to_string())),
    }
}

/// PUT /users/:id - Partial account update
async fn update_user(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UpdateUserResponse>> {
    let id = parse_id(&id)?;
    let actor = ctx.confirm_admin(&state.db)?;

    let mut user = state
        .db
        .find_user_by_id(id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    check_user_update(&actor, &user, body.is_admin.is_some())?;

    if let Some(name) = body.name {
        let name = name.trim().to_string();
        validate_name(&name)?;
        user.name = name;
    }

    if let Some(email) = body.email {
        let email = email.trim().to_string();
        validate_email(&email)?;
        if state.db.count_users_by_email(&email, Some(user.id))? > 0 {
            return Err(ApiError::DuplicateEmail);
        }
        user.email = email;
    }

    if let Some(password) = body.password {
        validate_password(&password)?;
        user.password_hash = state.passwords.hash(password).await?;
    }

    if let Some(is_admin) = body.is_admin {
        if user.is_admin != is_admin {
            tracing::info!(
                actor_id = actor.user_id,
                target_id = user.id,
                is_admin,
                "Admin flag changed"
            );
        }
        user.is_admin = is_admin;
    }

    state.db.save_user(&user)?;

    Ok(Json(UpdateUserResponse {
        message: "User updated".to_string(),
        user: user.profile(),
    }))
}

/// GET /users/:id/trips - Trips owned by one user (self or admin)
async fn user_trips(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Trip>>> {
    let id = parse_id(&id)?;
    let ctx = ctx.confirm_admin(&state.db)?;
    if !ctx.can_access(id) {
        return Err(ApiError::Forbidden(
            "You can only list your own trips".to_string(),
        ));
    }
    Ok(Json(state.db.list_trips(Some(id))?))
}

pub fn router(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/me", get(me))
        .route("/user", get(find_by_email))
        .route("/users/:id", put(update_user))
        .route("/users/:id/trips", get(user_trips))
        .merge(admin_routes)
        .with_state(state)
}
