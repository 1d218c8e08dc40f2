//! Filesystem media store.

use async_trait::async_trait;
use serde_json::json;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::MediaStore;
use crate::error::AppError;

/// Stores uploads under a root directory.
///
/// A key `heroes/AbC.png` is written to `<root>/heroes/AbC.png` and served at
/// `<base_url>/heroes/AbC.png`.
pub struct FilesystemMediaStore {
    root: PathBuf,
    base_url: String,
}

impl FilesystemMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves a key to a path inside the root; rejects traversal.
    fn key_to_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let mut components = relative.components().peekable();
        components.peek()?;
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(relative))
    }

    fn url_to_key<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.base_url)?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
    }
}

fn storage_error(action: &str, key: &str, e: std::io::Error) -> AppError {
    AppError::internal(
        format!("Failed to {action} media"),
        json!({ "key": key, "reason": e.to_string() }),
    )
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let path = self.key_to_path(key).ok_or_else(|| {
            AppError::internal("Invalid media key", json!({ "key": key }))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("store", key, e))?;
        }

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| storage_error("store", key, e))?;
        file.write_all(&content)
            .await
            .map_err(|e| storage_error("store", key, e))?;
        file.sync_all()
            .await
            .map_err(|e| storage_error("store", key, e))?;

        debug!("Stored media {} ({} bytes)", key, content.len());

        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn delete(&self, url: &str) -> Result<bool, AppError> {
        let Some(key) = self.url_to_key(url) else {
            return Ok(false);
        };
        let Some(path) = self.key_to_path(key) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted media {}", key);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error("delete", key, e)),
        }
    }

    async fn health_check(&self) -> bool {
        if fs::create_dir_all(&self.root).await.is_err() {
            return false;
        }
        fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }
}
