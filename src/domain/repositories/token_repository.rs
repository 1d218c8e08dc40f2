//! Repository trait for API token authentication.

use crate::domain::entities::{ApiToken, Role};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for API token management.
///
/// Handles token validation, creation, and revocation for API authentication.
/// Tokens are stored as HMAC-SHA256 hashes (see [`crate::utils::token`]).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTokenRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_token.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Looks up an active (non-revoked) token by hash.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(token))` if the token is valid and not revoked
    /// - `Ok(None)` if the token is unknown or revoked
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn validate_token(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError>;

    /// Updates the last_used timestamp for a token.
    ///
    /// Called after successful authentication to track token usage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError>;

    /// Creates a new API token.
    ///
    /// # Arguments
    ///
    /// - `name` - Human-readable token identifier
    /// - `token_hash` - HMAC-SHA256 hash of the raw token
    /// - `role` - Role granted to requests using this token
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a token with the same name or hash already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create_token(
        &self,
        name: &str,
        token_hash: &str,
        role: Role,
    ) -> Result<ApiToken, AppError>;

    /// Lists all tokens in the system.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError>;

    /// Finds a token by its database ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError>;

    /// Finds a token by its name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError>;

    /// Revokes a token, preventing further authentication.
    ///
    /// Sets the `revoked_at` timestamp to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the token does not exist or is already revoked.
    /// Returns [`AppError::Internal`] on database errors.
    async fn revoke_token(&self, id: i64) -> Result<(), AppError>;
}
