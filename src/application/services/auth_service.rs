//! Authentication service for API token validation.

use std::sync::Arc;

use crate::domain::entities::Principal;
use crate::domain::repositories::TokenRepository;
use crate::error::AppError;
use crate::utils::token::hash_token;
use serde_json::json;
use tracing::warn;

/// Service for authenticating API requests via Bearer tokens.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before lookup.
/// An attacker with read-only access to the database cannot verify or forge
/// tokens without the server-side secret.
pub struct AuthService<R: TokenRepository> {
    repository: Arc<R>,
    signing_secret: String,
}

impl<R: TokenRepository> AuthService<R> {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `repository` - token repository for DB operations
    /// - `signing_secret` - HMAC key; must match the value the admin CLI used
    ///   when tokens were created
    pub fn new(repository: Arc<R>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Authenticates a raw token and returns the caller it belongs to.
    ///
    /// On success, updates the `last_used_at` timestamp for auditing; a
    /// failure to do so is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown or revoked.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        let token_hash = hash_token(&self.signing_secret, token);

        let Some(api_token) = self.repository.validate_token(&token_hash).await? else {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Invalid or revoked token"}),
            ));
        };

        if let Err(e) = self.repository.update_last_used(&token_hash).await {
            warn!("Failed to update last_used_at for token {}: {}", api_token.id, e);
        }

        Ok(Principal::from(&api_token))
    }
}
