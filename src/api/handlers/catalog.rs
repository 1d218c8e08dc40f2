//! Handler for the resource catalog endpoint.

use axum::Json;

use crate::api::dto::catalog::{CatalogResponse, ResourceItem};
use crate::domain::catalog;

/// Describes every resource: fields, kinds, associations and visibility.
///
/// # Endpoint
///
/// `GET /api/catalog`
///
/// Lets admin clients build forms without hard-coding each resource.
pub async fn catalog_handler() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        resources: catalog::all().iter().map(ResourceItem::from).collect(),
    })
}
