//! Data Transfer Objects for API requests and responses.
//!
//! Content rows are returned as plain JSON records; only list parameters,
//! the catalog and the health check have dedicated types.

pub mod catalog;
pub mod content;
pub mod health;
