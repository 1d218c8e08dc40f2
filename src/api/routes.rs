//! API route configuration.
//!
//! Bearer tokens are optional at this level; each handler checks the
//! resource's visibility and the caller's role.

use crate::api::handlers::{
    catalog_handler, create_handler, delete_handler, get_by_slug_handler, get_handler,
    list_handler, update_handler,
};
use crate::api::middleware::auth;
use crate::state::AppState;
use axum::{Router, middleware, routing::get};

/// Generic content routes, shared by every catalog resource.
///
/// # Endpoints
///
/// - `GET    /catalog`                 - Resource definitions
/// - `GET    /{resource}`              - List records (filters, pagination)
/// - `POST   /{resource}`              - Create a record (JSON or multipart)
/// - `GET    /{resource}/{id}`         - Fetch a record with associations
/// - `PUT    /{resource}/{id}`         - Partially update a record
/// - `PATCH  /{resource}/{id}`         - Same as `PUT`
/// - `DELETE /{resource}/{id}`         - Delete a record (admin only)
/// - `GET    /{resource}/slug/{slug}`  - Fetch a record by slug
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(catalog_handler))
        .route("/{resource}", get(list_handler).post(create_handler))
        .route(
            "/{resource}/{id}",
            get(get_handler)
                .put(update_handler)
                .patch(update_handler)
                .delete(delete_handler),
        )
        .route("/{resource}/slug/{slug}", get(get_by_slug_handler))
}

/// Content routes with token resolution applied, ready to nest under `/api`.
pub fn api_router(state: AppState) -> Router<AppState> {
    content_routes().route_layer(middleware::from_fn_with_state(state, auth::layer))
}
