//! Trip endpoints. Every route here sits behind `require_auth`.
//!
//! Regular users only ever see and change their own trips. Admins (confirmed
//! against the store) see and change everyone's.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use travelmate_common::{
    BulkDeleteRequest, BulkDeleteResponse, BulkUpdateRequest, BulkUpdateResponse,
    MessageResponse, SearchQuery, Trip, TripInput,
};

use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::extract::ApiJson;
use crate::routes::{check_ids, parse_id};
use crate::AppState;

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    Ok(())
}

/// Load a trip the caller is allowed to touch.
fn owned_trip(state: &AppState, ctx: &AuthContext, id: u64) -> ApiResult<Trip> {
    let trip = state
        .db
        .get_trip(id)?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;
    if !ctx.can_access(trip.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have access to this trip".to_string(),
        ));
    }
    Ok(trip)
}

/// GET /trips - The caller's trips (all trips for admins)
async fn list_trips(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> ApiResult<Json<Vec<Trip>>> {
    let ctx = ctx.confirm_admin(&state.db)?;
    Ok(Json(state.db.list_trips(ctx.owner_scope())?))
}

/// GET /trips/:id
async fn get_trip(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Trip>> {
    let id = parse_id(&id)?;
    let ctx = ctx.confirm_admin(&state.db)?;
    Ok(Json(owned_trip(&state, &ctx, id)?))
}

/// POST /trips - Create a trip owned by the caller
async fn create_trip(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ApiJson(input): ApiJson<TripInput>,
) -> ApiResult<(StatusCode, Json<Trip>)> {
    validate_title(&input.title)?;
    // The token may outlive its account (deleted by an admin reset).
    if state.db.find_user_by_id(ctx.user_id)?.is_none() {
        return Err(ApiError::Unauthorized(AuthFailure::TokenInvalid));
    }
    let trip = state.db.create_trip(ctx.user_id, &input)?;
    tracing::debug!(trip_id = trip.id, user_id = ctx.user_id, "Trip created");
    Ok((StatusCode::CREATED, Json(trip)))
}

/// PUT /trips/:id - Replace a trip's content
async fn update_trip(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TripInput>,
) -> ApiResult<Json<Trip>> {
    let id = parse_id(&id)?;
    let ctx = ctx.confirm_admin(&state.db)?;
    owned_trip(&state, &ctx, id)?;
    validate_title(&input.title)?;
    Ok(Json(state.db.update_trip(id, &input)?))
}

/// DELETE /trips/:id
async fn delete_trip(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    let ctx = ctx.confirm_admin(&state.db)?;
    owned_trip(&state, &ctx, id)?;
    state.db.delete_trip(id)?;
    Ok(Json(MessageResponse::new("Trip deleted")))
}

/// PUT /trips - Apply the same changes to several trips
async fn bulk_update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ApiJson(body): ApiJson<BulkUpdateRequest>,
) -> ApiResult<Json<BulkUpdateResponse>> {
    if body.ids.is_empty() || body.update.is_empty() {
        return Err(ApiError::Validation(
            "Both 'ids' and 'update' must be non-empty".to_string(),
        ));
    }
    check_ids(&body.ids)?;
    if let Some(title) = &body.update.title {
        validate_title(title)?;
    }

    let ctx = ctx.confirm_admin(&state.db)?;
    let updated = state
        .db
        .bulk_update_trips(&body.ids, &body.update, ctx.owner_scope())?;

    Ok(Json(BulkUpdateResponse {
        message: "Trips updated".to_string(),
        updated,
    }))
}

/// DELETE /trips - Delete several trips
async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ApiJson(body): ApiJson<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    if body.ids.is_empty() {
        return Err(ApiError::Validation("'ids' must be non-empty".to_string()));
    }
    check_ids(&body.ids)?;

    let ctx = ctx.confirm_admin(&state.db)?;
    let deleted = state.db.bulk_delete_trips(&body.ids, ctx.owner_scope())?;

    Ok(Json(BulkDeleteResponse {
        message: "Trips deleted".to_string(),
        deleted,
    }))
}

/// GET /trips/search?query=
async fn search_trips(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Trip>>> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("Query parameter 'query' is required".to_string()))?;

    let ctx = ctx.confirm_admin(&state.db)?;
    Ok(Json(state.db.search_trips(query, ctx.owner_scope())?))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/trips",
            get(list_trips)
                .post(create_trip)
                .put(bulk_update)
                .delete(bulk_delete),
        )
        .route("/trips/search", get(search_trips))
        .route(
            "/trips/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .with_state(state)
}
