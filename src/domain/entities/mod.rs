//! Core domain entities.
//!
//! Content rows are schemaless at the type level: a [`Record`] is a JSON
//! object shaped by its [`crate::domain::catalog::ResourceDef`]. Writes go
//! through typed [`FieldValue`]s produced by [`crate::domain::input`].
//!
//! - [`Record`], [`NewRecord`], [`RecordPatch`] - content rows and writes
//! - [`ListQuery`] - pagination and filters
//! - [`ApiToken`], [`Role`], [`Principal`] - authentication

pub mod api_token;
pub mod record;

pub use api_token::{ApiToken, Principal, Role};
pub use record::{
    ContentInput, FieldValue, LinkSets, ListQuery, NewRecord, Record, RecordPatch, RelatedRecord,
    record_id,
};
