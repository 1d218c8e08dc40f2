//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and media storage.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`media`] - Uploaded file storage
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod media;
pub mod persistence;
