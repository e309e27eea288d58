//! Admin API routes.
//!
//! Mounted under `/admin`, behind `require_auth` and `require_admin`.

use std::sync::Arc;

use axum::{extract::State, middleware, routing::post, Json, Router};
use travelmate_common::ResetResponse;

use crate::auth::{require_admin, AuthContext};
use crate::error::ApiResult;
use crate::AppState;

/// POST /admin/reset - Delete all trips and all non-admin accounts
async fn reset_database(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> ApiResult<Json<ResetResponse>> {
    let (trips_deleted, users_deleted) = state.db.reset()?;

    tracing::warn!(
        admin_id = ctx.user_id,
        trips_deleted,
        users_deleted,
        "Database reset"
    );

    Ok(Json(ResetResponse {
        message: "Database reset".to_string(),
        trips_deleted,
        users_deleted,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/reset", post(reset_database))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
