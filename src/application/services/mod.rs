//! Business logic services for the application layer.

pub mod auth_service;
pub mod content_service;
pub mod media_service;

pub use auth_service::AuthService;
pub use content_service::ContentService;
pub use media_service::{MediaService, UploadedFile};
