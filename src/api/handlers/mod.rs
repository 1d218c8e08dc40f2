//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod catalog;
pub mod content;
pub mod health;

pub use catalog::catalog_handler;
pub use content::{
    create_handler, delete_handler, get_by_slug_handler, get_handler, list_handler, update_handler,
};
pub use health::health_handler;
