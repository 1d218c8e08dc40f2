//! Utility functions shared by the server and the admin CLI.
//!
//! - [`slug`] - Slug generation and validation
//! - [`token`] - API token generation and HMAC hashing
//! - [`key_generator`] - Random keys for stored media

pub mod key_generator;
pub mod slug;
pub mod token;
