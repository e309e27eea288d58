use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let counts = state
        .db
        .count_users()
        .and_then(|users| state.db.count_trips().map(|trips| (users, trips)));

    let (users, trips) = match counts {
        Ok(counts) => counts,
        Err(e) => {
            tracing::error!("Failed to read metrics: {}", e);
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let version = env!("CARGO_PKG_VERSION");
    let body = format!(
        "# HELP travelmate_up Whether the service is up\n\
         # TYPE travelmate_up gauge\n\
         travelmate_up 1\n\
         # HELP travelmate_info Service information\n\
         # TYPE travelmate_info gauge\n\
         travelmate_info{{version=\"{}\"}} 1\n\
         # HELP travelmate_users Registered accounts\n\
         # TYPE travelmate_users gauge\n\
         travelmate_users {}\n\
         # HELP travelmate_trips Stored trips\n\
         # TYPE travelmate_trips gauge\n\
         travelmate_trips {}\n",
        version, users, trips
    );
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}
