//! Repository trait definitions for the domain layer.
//!
//! Traits define the data access contract; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`ContentRepository`] - CRUD for every catalog resource
//! - [`TokenRepository`] - API token authentication
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod content_repository;
pub mod token_repository;

pub use content_repository::ContentRepository;
pub use token_repository::TokenRepository;

#[cfg(test)]
pub use content_repository::MockContentRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
