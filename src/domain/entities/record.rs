//! Content records and typed field values.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single content row rendered as a JSON object.
///
/// Keys are column names plus any eager-loaded association keys.
pub type Record = Map<String, Value>;

/// Reads the `id` column of a record.
pub fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

/// A typed value for one field, ready to be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Field values for inserting a new record.
///
/// Fields absent from the map take their column default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRecord {
    pub values: BTreeMap<&'static str, FieldValue>,
}

/// Partial update: only fields present in the map are changed.
///
/// Link sets listed in `links` replace the owner's current links in the same
/// transaction as the column update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub values: BTreeMap<&'static str, FieldValue>,
    pub links: LinkSets,
}

/// Requested many-to-many link sets, keyed by association key.
pub type LinkSets = BTreeMap<&'static str, Vec<i64>>;

/// Validated request input for a create or update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentInput {
    pub values: BTreeMap<&'static str, FieldValue>,
    pub links: LinkSets,
}

/// Pagination and equality filters for list queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub filters: Vec<(&'static str, FieldValue)>,
}

impl ListQuery {
    /// Whether this query returns the full, unfiltered list.
    pub fn is_unbounded(&self) -> bool {
        self.offset.is_none() && self.limit.is_none() && self.filters.is_empty()
    }
}

/// An associated row together with the id of the row it was loaded for.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedRecord {
    pub owner_id: i64,
    pub record: Record,
}
