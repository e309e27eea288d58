use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::auth::AuthContext;

/// Middleware that logs every HTTP request.
///
/// Authenticated requests also record the caller, taken from the
/// [`AuthContext`] that `require_auth` leaves on the response. 4xx responses
/// log at WARN and 5xx at ERROR.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();
    let caller = response.extensions().get::<AuthContext>().copied();
    let user_id = caller.map(|c| c.user_id);
    let is_admin = caller.map(|c| c.is_admin);

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            user_id = ?user_id,
            is_admin = ?is_admin,
            "HTTP request failed"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            user_id = ?user_id,
            is_admin = ?is_admin,
            "HTTP request rejected"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            user_id = ?user_id,
            is_admin = ?is_admin,
            "HTTP request"
        );
    }

    response
}
