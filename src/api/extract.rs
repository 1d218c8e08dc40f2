//! Request extractors shared by content handlers.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Request, multipart::MultipartError},
    http::{StatusCode, header, request::Parts},
};
use serde_json::{Map, Value, json};
use std::convert::Infallible;

use crate::application::services::UploadedFile;
use crate::domain::entities::Principal;
use crate::error::AppError;

/// The authenticated caller, if the request carried a valid token.
///
/// Set by [`crate::api::middleware::auth::layer`].
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

impl<S: Send + Sync> FromRequestParts<S> for MaybePrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Principal>().cloned()))
    }
}

/// Create/update body, either JSON or `multipart/form-data`.
///
/// Multipart text parts become string fields; a name sent more than once
/// (or ending in `[]`) becomes an array. File parts are collected separately
/// and stored by the handler.
#[derive(Debug, Default)]
pub struct ContentBody {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

impl<S: Send + Sync> FromRequest<S> for ContentBody {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                AppError::bad_request("Invalid multipart body", json!({ "reason": e.body_text() }))
            })?;
            return read_multipart(multipart).await;
        }

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state).await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::payload_too_large("Request body is too large", json!({}))
                } else {
                    AppError::bad_request("Invalid JSON body", json!({ "reason": e.body_text() }))
                }
            })?;

            let Value::Object(fields) = value else {
                return Err(AppError::bad_request(
                    "Request body must be a JSON object",
                    json!({}),
                ));
            };

            return Ok(Self {
                fields,
                files: Vec::new(),
            });
        }

        Err(AppError::unsupported_media_type(
            "Expected application/json or multipart/form-data",
            json!({ "content_type": content_type }),
        ))
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Request body is too large", json!({}))
    } else {
        AppError::bad_request("Invalid multipart body", json!({ "reason": e.body_text() }))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ContentBody, AppError> {
    let mut body = ContentBody::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(raw_name) = field.name() else {
            continue;
        };
        let is_array = raw_name.ends_with("[]");
        let name = raw_name.trim_end_matches("[]").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;

            // Browsers send an empty part for file inputs left blank.
            if bytes.is_empty() && file_name.is_empty() {
                continue;
            }

            body.files.push(UploadedFile {
                field: name,
                file_name: Some(file_name),
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field.text().await.map_err(multipart_error)?;
        push_text(&mut body.fields, name, text, is_array);
    }

    Ok(body)
}

fn push_text(fields: &mut Map<String, Value>, name: String, text: String, is_array: bool) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(Value::String(text)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(text)]);
        }
        None if is_array => {
            fields.insert(name, Value::Array(vec![Value::String(text)]));
        }
        None => {
            fields.insert(name, Value::String(text));
        }
    }
}
