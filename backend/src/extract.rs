//! Body extractors that report decoding failures as [`ApiError::Validation`].

use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Body sent as JSON, as an urlencoded form, or as `multipart/form-data`.
///
/// The web client posts login and registration as `FormData`; other clients
/// send JSON. Multipart fields are read as text.
pub struct FormOrJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;

            let mut fields = Map::new();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?
            {
                let Some(name) = field.name().map(str::to_owned) else {
                    continue;
                };
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.body_text()))?;
                fields.insert(name, Value::String(text));
            }

            let value = serde_json::from_value(Value::Object(fields))
                .map_err(|e| ApiError::Validation(format!("Invalid form data: {}", e)))?;
            return Ok(Self(value));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            return Ok(Self(value));
        }

        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
