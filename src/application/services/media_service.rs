//! Upload validation and media lifecycle.

use metrics::counter;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::catalog::ResourceDef;
use crate::domain::entities::Record;
use crate::error::AppError;
use crate::infrastructure::media::MediaStore;
use crate::utils::key_generator::generate_media_key;

/// Accepted image types and the extension stored files get.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
];

/// A file part received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Stores uploaded images and releases the ones records no longer use.
pub struct MediaService<S: MediaStore> {
    store: Arc<S>,
    max_upload_bytes: usize,
}

impl<S: MediaStore> MediaService<S> {
    pub fn new(store: Arc<S>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }

    /// Validates and stores an upload for `resource`, returning its public URL.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for an empty file
    /// - [`AppError::PayloadTooLarge`] above `MAX_UPLOAD_BYTES`
    /// - [`AppError::UnsupportedMediaType`] for anything but png, jpeg, webp, gif or svg
    pub async fn store(
        &self,
        resource: &ResourceDef,
        upload: UploadedFile,
    ) -> Result<String, AppError> {
        let (content_type, extension) = self.validate(&upload)?;

        let key = format!("{}/{}.{}", resource.name, generate_media_key()?, extension);
        let size = upload.bytes.len();
        let url = self.store.put(&key, upload.bytes, content_type).await?;

        counter!("cms_media_uploads_total", "resource" => resource.name).increment(1);
        debug!("Stored {} upload for {}.{} at {}", size, resource.name, upload.field, url);

        Ok(url)
    }

    fn validate(&self, upload: &UploadedFile) -> Result<(&'static str, &'static str), AppError> {
        if upload.bytes.is_empty() {
            return Err(AppError::bad_request(
                "Uploaded file is empty",
                json!({ "field": upload.field }),
            ));
        }

        if upload.bytes.len() > self.max_upload_bytes {
            return Err(AppError::payload_too_large(
                "Uploaded file is too large",
                json!({
                    "field": upload.field,
                    "size": upload.bytes.len(),
                    "max_bytes": self.max_upload_bytes,
                }),
            ));
        }

        let declared = upload
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .filter(|ct| ct != "application/octet-stream" && !ct.is_empty());

        let detected = match declared {
            Some(ct) => ALLOWED_TYPES.iter().find(|(t, _)| *t == ct),
            None => upload
                .file_name
                .as_deref()
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .and_then(|ext| {
                    let ext = if ext == "jpeg" { "jpg".to_string() } else { ext };
                    ALLOWED_TYPES.iter().find(|(_, e)| *e == ext)
                }),
        };

        detected.copied().ok_or_else(|| {
            AppError::unsupported_media_type(
                "Unsupported file type",
                json!({
                    "field": upload.field,
                    "content_type": upload.content_type,
                    "allowed": ALLOWED_TYPES.iter().map(|(t, _)| *t).collect::<Vec<_>>(),
                }),
            )
        })
    }

    /// Deletes a stored file. Failures are logged, never returned.
    pub async fn release(&self, url: &str) {
        match self.store.delete(url).await {
            Ok(true) => debug!("Released media {}", url),
            Ok(false) => {}
            Err(e) => warn!("Failed to release media {}: {}", url, e),
        }
    }

    pub async fn release_all(&self, urls: &[String]) {
        for url in urls {
            self.release(url).await;
        }
    }

    /// Image URLs referenced by a record.
    pub fn record_urls(&self, resource: &ResourceDef, record: &Record) -> Vec<String> {
        resource
            .image_fields()
            .filter_map(|field| record.get(field.name).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Image URLs an update replaced or cleared.
    pub fn replaced_urls(
        &self,
        resource: &ResourceDef,
        previous: &Record,
        current: &Record,
    ) -> Vec<String> {
        resource
            .image_fields()
            .filter_map(|field| {
                let old = previous.get(field.name).and_then(Value::as_str)?;
                let new = current.get(field.name).and_then(Value::as_str);
                (new != Some(old)).then(|| old.to_string())
            })
            .collect()
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }
}
