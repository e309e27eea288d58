pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod models;
pub mod routes;
pub mod store;
pub mod test_util;
pub mod validation;

pub use auth::{AuthContext, PasswordHasher, TokenService};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use store::Database;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;

/// Shared application state, built once at startup.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
}

impl AppState {
    /// Wire up the token service and hasher from `config`.
    pub fn new(config: Config, db: Database) -> Result<Self, auth::TokenError> {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_hours)?;
        let passwords = PasswordHasher::new(config.auth.bcrypt_cost);
        Ok(Self {
            config,
            db,
            tokens,
            passwords,
        })
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(12 * 60 * 60));

    if config.origins.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

/// Build the full HTTP application.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(routes::users::router(state.clone()))
        .merge(routes::trips::router(state.clone()))
        .nest("/admin", routes::admin::router(state.clone()))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .merge(routes::health::router(state.clone()))
        .merge(routes::auth::router(state.clone()))
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
}
