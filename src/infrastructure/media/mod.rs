//! Media storage backends for uploaded images.
//!
//! - [`FilesystemMediaStore`] - Local directory served by the router under `/uploads`

mod filesystem;

pub use filesystem::FilesystemMediaStore;

use async_trait::async_trait;

use crate::error::AppError;

/// Storage backend for uploaded media.
///
/// Keys are relative paths such as `heroes/AbC123.png`; the store decides
/// the public URL they are served from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores content under `key` and returns its public URL.
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str)
    -> Result<String, AppError>;

    /// Deletes the file behind a public URL.
    ///
    /// Returns `Ok(false)` when the URL does not belong to this store
    /// (external images) or the file is already gone.
    async fn delete(&self, url: &str) -> Result<bool, AppError>;

    /// Checks that the backend is writable.
    async fn health_check(&self) -> bool;
}
