//! Registration and login. Both endpoints are public.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use travelmate_common::{LoginRequest, RegisterRequest, TokenResponse};

use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::extract::FormOrJson;
use crate::models::NewUser;
use crate::validation::{validate_email, validate_name, validate_password};
use crate::AppState;

/// POST /register - Create a regular account and return a token for it
async fn register(
    State(state): State<Arc<AppState>>,
    FormOrJson(body): FormOrJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let name = body.name.trim().to_string();
    let email = body.email.trim().to_string();

    validate_name(&name)?;
    validate_email(&email)?;
    validate_password(&body.password)?;

    if state.db.count_users_by_email(&email, None)? > 0 {
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = state.passwords.hash(body.password).await?;

    // Registration never grants admin; the UNIQUE index catches racing sign-ups.
    let user = state.db.create_user(&NewUser {
        name,
        email,
        password_hash,
        is_admin: false,
    })?;

    let token = state.tokens.issue(user.id, user.is_admin)?;
    tracing::info!(user_id = user.id, "Registered new user");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "Registration successful".to_string(),
            token,
        }),
    ))
}

/// POST /login - Exchange email and password for a token
async fn login(
    State(state): State<Arc<AppState>>,
    FormOrJson(body): FormOrJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let Some(user) = state.db.find_user_by_email(email)? else {
        state.passwords.verify_absent(body.password).await?;
        return Err(ApiError::Unauthorized(AuthFailure::BadCredentials));
    };

    let valid = state
        .passwords
        .verify(body.password, user.password_hash.clone())
        .await?;
    if !valid {
        return Err(ApiError::Unauthorized(AuthFailure::BadCredentials));
    }

    let token = state.tokens.issue(user.id, user.is_admin)?;
    tracing::info!(user_id = user.id, is_admin = user.is_admin, "User logged in");

    Ok(Json(TokenResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}
