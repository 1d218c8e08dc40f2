//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx. Content
//! queries are built at runtime from the resource catalog.
//!
//! # Repositories
//!
//! - [`PgContentRepository`] - Storage for every catalog resource
//! - [`PgTokenRepository`] - API token storage and validation

pub mod pg_content_repository;
pub mod pg_token_repository;

pub use pg_content_repository::PgContentRepository;
pub use pg_token_repository::PgTokenRepository;
