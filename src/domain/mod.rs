//! Domain layer containing the content model and its rules.
//!
//! Independent of HTTP and storage concerns.
//!
//! - [`catalog`] - Static description of every content resource
//! - [`entities`] - Records, typed values, tokens and roles
//! - [`input`] - Coercion of request input into typed values
//! - [`access`] - Who may read and write which resource
//! - [`repositories`] - Data access trait definitions

pub mod access;
pub mod catalog;
pub mod entities;
pub mod input;
pub mod repositories;
