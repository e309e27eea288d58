use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, AuthFailure};
use crate::AppState;

use super::AuthContext;

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthFailure::MissingToken)?
        .to_str()
        .map_err(|_| AuthFailure::TokenInvalid)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthFailure::TokenInvalid)?
        .trim();

    if token.is_empty() {
        return Err(AuthFailure::TokenInvalid);
    }
    Ok(token)
}

/// Middleware that requires a valid bearer token.
///
/// On success the caller's [`AuthContext`] is stored in the request
/// extensions for handlers, and in the response extensions for the request
/// logger.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).map_err(ApiError::Unauthorized)?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    let context = AuthContext::from(&claims);
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;
    response.extensions_mut().insert(context);
    Ok(response)
}

/// Middleware that requires an authenticated admin. Runs inside
/// [`require_auth`] and confirms the flag against the store.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(ApiError::Unauthorized(AuthFailure::MissingToken))?;

    let context = context.confirm_admin(&state.db)?;
    if !context.is_admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
