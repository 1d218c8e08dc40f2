//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{AuthService, ContentService, MediaService};
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::media::FilesystemMediaStore;
use crate::infrastructure::persistence::{PgContentRepository, PgTokenRepository};

/// Services and shared resources for request handlers.
///
/// Cheap to clone: every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub content_service: Arc<ContentService<PgContentRepository>>,
    pub auth_service: Arc<AuthService<PgTokenRepository>>,
    pub media_service: Arc<MediaService<FilesystemMediaStore>>,
    pub cache: Arc<dyn CacheService>,
}

impl AppState {
    /// Wires repositories and services on top of a connection pool.
    pub fn new(
        pool: Arc<PgPool>,
        cache: Arc<dyn CacheService>,
        media_store: FilesystemMediaStore,
        token_signing_secret: String,
        max_upload_bytes: usize,
    ) -> Self {
        let content_repository = Arc::new(PgContentRepository::new(pool.clone()));
        let token_repository = Arc::new(PgTokenRepository::new(pool));

        Self {
            content_service: Arc::new(ContentService::new(content_repository)),
            auth_service: Arc::new(AuthService::new(token_repository, token_signing_secret)),
            media_service: Arc::new(MediaService::new(
                Arc::new(media_store),
                max_upload_bytes,
            )),
            cache,
        }
    }
}
