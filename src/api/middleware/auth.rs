//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::{error::AppError, state::AppState};

/// Resolves the caller from an optional Bearer token.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Authentication Flow
///
/// 1. No `Authorization` header: continue anonymously (public reads and
///    inbox submissions are decided per resource by the handlers)
/// 2. Extract token from the header
/// 3. Validate the token hash and check it is not revoked
/// 4. Store the [`crate::domain::entities::Principal`] in request extensions
/// 5. Continue to next middleware/handler
///
/// # Errors
///
/// Returns `401 Unauthorized` if a header is present but:
/// - Token format is invalid
/// - Token is not found or revoked
///
/// Adds `WWW-Authenticate: Bearer` header to 401 responses per RFC 6750.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::get, middleware};
/// use crate::api::middleware::auth;
///
/// let api = Router::new()
///     .route("/{resource}", get(list_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is invalid"}),
            )
        })?;

    let principal = st.auth_service.authenticate(&token).await?;
    parts.extensions.insert(principal);

    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
