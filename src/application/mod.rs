//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::content_service::ContentService`] - CRUD, slugs and includes for every resource
//! - [`services::media_service::MediaService`] - Upload validation and media cleanup
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
