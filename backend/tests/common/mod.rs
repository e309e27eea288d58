#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use travelmate_backend::test_util::{bearer, create_test_state};
use travelmate_backend::{build_router, AppState};

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn setup() -> (Arc<AppState>, Router) {
    let state = create_test_state();
    let app = build_router(state.clone());
    (state, app)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    dispatch(app, builder.body(body).unwrap()).await
}

pub async fn send_raw(app: &Router, uri: &str, content_type: &str, body: String) -> TestResponse {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    dispatch(app, req).await
}

pub async fn send_with_header(app: &Router, uri: &str, authorization: &str) -> TestResponse {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap();
    dispatch(app, req).await
}

async fn dispatch(app: &Router, req: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    TestResponse { status, body }
}

/// Register through the API and return the issued token.
pub async fn register(app: &Router, name: &str, email: &str, password: &str) -> String {
    let res = send(
        app,
        Method::POST,
        "/register",
        None,
        Some(serde_json::json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);
    res.body["token"].as_str().unwrap().to_string()
}

pub async fn login(app: &Router, email: &str, password: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        "/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await
}
