//! Generic CRUD handlers shared by every catalog resource.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tracing::{debug, error, warn};
use validator::Validate;

use crate::api::dto::content::ListParams;
use crate::api::extract::{ContentBody, MaybePrincipal};
use crate::application::services::UploadedFile;
use crate::domain::access::{Action, authorize};
use crate::domain::catalog::{self, FieldKind, ResourceDef, Visibility};
use crate::error::AppError;
use crate::infrastructure::cache::list_key;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("Invalid id", json!({ "id": raw })))
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Drops cached lists of `resource` and of every resource that renders it.
async fn invalidate_lists(state: &AppState, resource: &ResourceDef) {
    let names =
        std::iter::once(resource.name).chain(catalog::dependents(resource.name).map(|r| r.name));

    for name in names {
        if let Err(e) = state.cache.invalidate(name).await {
            error!("Failed to invalidate cached {} list: {}", name, e);
        }
    }
}

/// Releases images no record references any more.
///
/// Rows may share a stored URL, so each one is checked after the write.
/// A file is kept when the check itself fails.
async fn release_unreferenced(state: &AppState, urls: Vec<String>) {
    for url in urls {
        match state.content_service.media_referenced(&url).await {
            Ok(false) => state.media_service.release(&url).await,
            Ok(true) => debug!("Keeping media {} still in use", url),
            Err(e) => warn!("Failed to check references of {}: {}", url, e),
        }
    }
}

/// Stores uploaded files and writes their URLs into the body fields.
///
/// Files already stored are released again if a later one fails.
async fn store_uploads(
    state: &AppState,
    resource: &ResourceDef,
    fields: &mut Map<String, Value>,
    files: Vec<UploadedFile>,
) -> Result<Vec<String>, AppError> {
    let mut stored = Vec::with_capacity(files.len());

    for file in files {
        let is_image_field = resource
            .field(&file.field)
            .is_some_and(|f| f.kind == FieldKind::Image);

        if !is_image_field {
            state.media_service.release_all(&stored).await;
            return Err(AppError::bad_request(
                "Unexpected file field",
                json!({ "resource": resource.name, "field": file.field }),
            ));
        }

        let field = file.field.clone();
        match state.media_service.store(resource, file).await {
            Ok(url) => {
                fields.insert(field, Value::String(url.clone()));
                stored.push(url);
            }
            Err(e) => {
                state.media_service.release_all(&stored).await;
                return Err(e);
            }
        }
    }

    Ok(stored)
}

/// Lists records of a resource, newest first.
///
/// # Endpoint
///
/// `GET /api/{resource}`
///
/// # Query Parameters
///
/// - `page` - Page number, starting at 1
/// - `page_size` - Rows per page (1-100)
/// - any text, boolean, integer or reference field - equality filter
///
/// Without parameters the full list is returned; for public resources it is
/// served from cache when available.
///
/// # Errors
///
/// Returns 400 for bad pagination or filters, 401 for private resources
/// without a token, 404 for unknown resources.
pub async fn list_handler(
    Path(resource): Path<String>,
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let def = state.content_service.resource(&resource)?;
    authorize(def, Action::Read, principal.as_ref())?;

    let Query(params) = params.map_err(|e| {
        AppError::bad_request("Invalid query parameters", json!({ "reason": e.body_text() }))
    })?;
    params.validate()?;
    let query = params.into_list_query(def)?;

    let cacheable = def.visibility == Visibility::Public && query.is_unbounded();
    let cache_key = if cacheable {
        match state.cache.generation(def.name).await {
            Ok(generation) => Some(list_key(def.name, generation)),
            Err(e) => {
                error!("Cache error: {}", e);
                None
            }
        }
    } else {
        None
    };

    if let Some(key) = &cache_key {
        match state.cache.get(key).await {
            Ok(Some(body)) => {
                debug!("Serving cached {} list", def.name);
                return Ok(json_response(StatusCode::OK, body));
            }
            Ok(None) => {}
            Err(e) => error!("Cache error: {}", e),
        }
    }

    let records = state.content_service.list(def.name, query).await?;

    let body = serde_json::to_string(&records).map_err(|e| {
        AppError::internal("Failed to serialize response", json!({ "reason": e.to_string() }))
    })?;

    if let Some(cache_key) = cache_key {
        // Fire-and-forget cache write
        let cache = state.cache.clone();
        let body = body.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.set(&cache_key, &body, None).await {
                error!("Failed to cache list: {}", e);
            }
        });
    }

    Ok(json_response(StatusCode::OK, body))
}

/// Fetches one record with its associations.
///
/// # Endpoint
///
/// `GET /api/{resource}/{id}`
///
/// # Errors
///
/// Returns 400 for a malformed id and 404 if the row doesn't exist.
pub async fn get_handler(
    Path((resource, id)): Path<(String, String)>,
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Result<Json<Value>, AppError> {
    let def = state.content_service.resource(&resource)?;
    authorize(def, Action::Read, principal.as_ref())?;
    let id = parse_id(&id)?;

    let record = state.content_service.get(def.name, id).await?;

    Ok(Json(Value::Object(record)))
}

/// Fetches one record of a slugged resource.
///
/// # Endpoint
///
/// `GET /api/{resource}/slug/{slug}`
///
/// # Errors
///
/// Returns 400 if the resource has no slug and 404 if nothing matches.
pub async fn get_by_slug_handler(
    Path((resource, slug)): Path<(String, String)>,
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Result<Json<Value>, AppError> {
    let def = state.content_service.resource(&resource)?;
    authorize(def, Action::Read, principal.as_ref())?;

    let record = state.content_service.get_by_slug(def.name, &slug).await?;

    Ok(Json(Value::Object(record)))
}

/// Creates a record from JSON or multipart input.
///
/// # Endpoint
///
/// `POST /api/{resource}`
///
/// File parts must target an image field; their stored URL becomes the
/// field value. Stored files are released if the record can't be written.
///
/// # Errors
///
/// Returns 400 on validation errors, 401/403 without a sufficient token,
/// 409 on unique violations, 413/415 for rejected uploads.
pub async fn create_handler(
    Path(resource): Path<String>,
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    body: ContentBody,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let def = state.content_service.resource(&resource)?;
    authorize(def, Action::Create, principal.as_ref())?;

    let ContentBody { mut fields, files } = body;
    let stored = store_uploads(&state, def, &mut fields, files).await?;

    let record = match state.content_service.create(def.name, &fields).await {
        Ok(record) => record,
        Err(e) => {
            state.media_service.release_all(&stored).await;
            return Err(e);
        }
    };

    invalidate_lists(&state, def).await;

    Ok((StatusCode::CREATED, Json(Value::Object(record))))
}

/// Partially updates a record from JSON or multipart input.
///
/// # Endpoint
///
/// `PUT /api/{resource}/{id}` and `PATCH /api/{resource}/{id}`
///
/// Only fields present in the body change; columns and links are written
/// in one transaction. Images replaced or cleared by the update are released
/// from storage unless another record still uses them.
///
/// # Errors
///
/// Same as [`create_handler`], plus 404 if the row doesn't exist.
pub async fn update_handler(
    Path((resource, id)): Path<(String, String)>,
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    body: ContentBody,
) -> Result<Json<Value>, AppError> {
    let def = state.content_service.resource(&resource)?;
    authorize(def, Action::Update, principal.as_ref())?;
    let id = parse_id(&id)?;

    let ContentBody { mut fields, files } = body;
    let stored = store_uploads(&state, def, &mut fields, files).await?;

    let (previous, current) = match state.content_service.update(def.name, id, &fields).await {
        Ok(records) => records,
        Err(e) => {
            state.media_service.release_all(&stored).await;
            return Err(e);
        }
    };

    let replaced = state.media_service.replaced_urls(def, &previous, &current);
    release_unreferenced(&state, replaced).await;

    invalidate_lists(&state, def).await;

    Ok(Json(Value::Object(current)))
}

/// Hard-deletes a record and releases images no other record uses.
///
/// # Endpoint
///
/// `DELETE /api/{resource}/{id}`
///
/// # Errors
///
/// Returns 403 for editor tokens (admin only) and 404 if the row doesn't
/// exist.
pub async fn delete_handler(
    Path((resource, id)): Path<(String, String)>,
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Result<StatusCode, AppError> {
    let def = state.content_service.resource(&resource)?;
    authorize(def, Action::Delete, principal.as_ref())?;
    let id = parse_id(&id)?;

    let deleted = state.content_service.delete(def.name, id).await?;

    let urls = state.media_service.record_urls(def, &deleted);
    release_unreferenced(&state, urls).await;

    invalidate_lists(&state, def).await;

    Ok(StatusCode::NO_CONTENT)
}
