//! Error type returned by every handler.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::{PasswordError, TokenError, UpdateDenied};
use crate::store::StoreError;

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Login with an unknown email or a wrong password. Deliberately one case.
    BadCredentials,
    MissingToken,
    TokenInvalid,
    TokenExpired,
}

impl AuthFailure {
    fn error_type(&self) -> &'static str {
        match self {
            AuthFailure::BadCredentials => "invalid_credentials",
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::TokenInvalid => "invalid_token",
            AuthFailure::TokenExpired => "token_expired",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthFailure::BadCredentials => "Invalid credentials",
            AuthFailure::MissingToken => "Missing bearer token",
            AuthFailure::TokenInvalid => "Invalid token",
            AuthFailure::TokenExpired => "Token has expired",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("{}", .0.message())]
    Unauthorized(AuthFailure),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::DuplicateEmail => (StatusCode::CONFLICT, "duplicate_email"),
            ApiError::Unauthorized(failure) => (StatusCode::UNAUTHORIZED, failure.error_type()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!("Request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message
            }
        }));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => ApiError::Unauthorized(AuthFailure::TokenExpired),
            TokenError::Malformed | TokenError::BadSignature | TokenError::UnsupportedAlgorithm => {
                ApiError::Unauthorized(AuthFailure::TokenInvalid)
            }
            TokenError::Configuration | TokenError::InvalidLifetime(_) | TokenError::Signing(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<UpdateDenied> for ApiError {
    fn from(e: UpdateDenied) -> Self {
        ApiError::Forbidden(e.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
