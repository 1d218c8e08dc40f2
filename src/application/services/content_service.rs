//! Generic content service for every catalog resource.

use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::catalog::{self, AssociationKind, ResourceDef};
use crate::domain::entities::{FieldValue, ListQuery, NewRecord, Record, RecordPatch, record_id};
use crate::domain::input::{self, Mode};
use crate::domain::repositories::ContentRepository;
use crate::error::AppError;
use crate::utils::slug::{self, candidate, is_valid_slug, slugify};
use tracing::warn;

/// Number of suffixed candidates tried before a generated slug is rejected.
const MAX_SLUG_ATTEMPTS: u32 = 50;

/// Service for listing, reading and writing catalog resources.
///
/// Handles input coercion, slug generation and eager loading of associations
/// (`include`) so handlers stay resource-agnostic.
pub struct ContentService<R: ContentRepository> {
    repository: Arc<R>,
}

impl<R: ContentRepository> ContentService<R> {
    /// Creates a new content service.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Resolves a resource name from the URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the catalog has no such resource.
    pub fn resource(&self, name: &str) -> Result<&'static ResourceDef, AppError> {
        catalog::find(name)
            .ok_or_else(|| AppError::not_found("Unknown resource", json!({ "resource": name })))
    }

    /// Lists records with their associations, newest first.
    pub async fn list(&self, name: &str, query: ListQuery) -> Result<Vec<Record>, AppError> {
        let resource = self.resource(name)?;
        let mut records = self.repository.list(resource, query).await?;
        self.attach_includes(resource, &mut records).await?;
        Ok(records)
    }

    /// Fetches one record with its associations.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the resource or row doesn't exist.
    pub async fn get(&self, name: &str, id: i64) -> Result<Record, AppError> {
        let resource = self.resource(name)?;
        self.load(resource, id).await
    }

    /// Fetches one record of a slugged resource by slug.
    ///
    /// Tries an exact match first, then compares the slugified source field
    /// of every row (rows created without a slug or with a hand-edited one).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the resource has no slug and
    /// [`AppError::NotFound`] if nothing matches.
    pub async fn get_by_slug(&self, name: &str, slug: &str) -> Result<Record, AppError> {
        let resource = self.resource(name)?;
        let Some(slug_from) = resource.slug_from else {
            return Err(AppError::bad_request(
                "Resource has no slug",
                json!({ "resource": resource.name }),
            ));
        };

        let record = match self.repository.find_by_slug(resource, slug).await? {
            Some(record) => Some(record),
            None => self.find_by_slugified(resource, slug_from, slug).await?,
        };

        let Some(record) = record else {
            return Err(AppError::not_found(
                "Record not found",
                json!({ "resource": resource.name, "slug": slug }),
            ));
        };

        let mut records = vec![record];
        self.attach_includes(resource, &mut records).await?;
        Ok(records.remove(0))
    }

    /// Creates a record from raw request input.
    ///
    /// Generates a unique slug when the resource has one and none was given,
    /// then writes many-to-many links. The created row is removed again if
    /// its links can't be written.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for invalid input or unknown linked ids
    /// - [`AppError::Conflict`] on unique violations or slug exhaustion
    pub async fn create(&self, name: &str, raw: &Map<String, Value>) -> Result<Record, AppError> {
        let resource = self.resource(name)?;
        let mut input = input::coerce(resource, raw, Mode::Create)?;

        if let Some(slug_from) = resource.slug_from {
            match input.values.get("slug").and_then(|v| v.as_str()) {
                Some(slug) => validate_slug(slug)?,
                None => {
                    let source = input
                        .values
                        .get(slug_from)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    let slug = self.unique_slug(resource, &slugify(source)).await?;
                    input.values.insert("slug", FieldValue::Text(slug));
                }
            }
        }

        let created = self
            .repository
            .create(resource, NewRecord { values: input.values })
            .await?;

        let id = record_id(&created).ok_or_else(|| {
            AppError::internal("Created row has no id", json!({ "resource": resource.name }))
        })?;

        for (key, ids) in input.links {
            let Some(association) = resource.association(key) else {
                continue;
            };
            if let Err(e) = self
                .repository
                .replace_links(resource, association, id, ids)
                .await
            {
                if let Err(cleanup) = self.repository.delete(resource, id).await {
                    warn!(
                        "Failed to remove {} {} after link error: {}",
                        resource.name, id, cleanup
                    );
                }
                return Err(e);
            }
        }

        self.load(resource, id).await
    }

    /// Applies a partial update from raw request input.
    ///
    /// Column changes and link replacements commit together or not at all.
    /// Returns `(previous, current)` so callers can release media the update
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the row doesn't exist, plus the
    /// errors of [`Self::create`].
    pub async fn update(
        &self,
        name: &str,
        id: i64,
        raw: &Map<String, Value>,
    ) -> Result<(Record, Record), AppError> {
        let resource = self.resource(name)?;

        let previous = self
            .repository
            .find_by_id(resource, id)
            .await?
            .ok_or_else(|| not_found(resource, id))?;

        let input = input::coerce(resource, raw, Mode::Update)?;

        if resource.has_slug()
            && let Some(slug) = input.values.get("slug").and_then(|v| v.as_str())
        {
            validate_slug(slug)?;
        }

        let patch = RecordPatch {
            values: input.values,
            links: input.links,
        };
        self.repository
            .update(resource, id, patch)
            .await?
            .ok_or_else(|| not_found(resource, id))?;

        let current = self.load(resource, id).await?;
        Ok((previous, current))
    }

    /// Hard-deletes a record and returns the removed row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the row doesn't exist.
    pub async fn delete(&self, name: &str, id: i64) -> Result<Record, AppError> {
        let resource = self.resource(name)?;
        self.repository
            .delete(resource, id)
            .await?
            .ok_or_else(|| not_found(resource, id))
    }

    /// Row count of every resource, in catalog order.
    pub async fn resource_counts(&self) -> Result<Vec<(&'static str, i64)>, AppError> {
        let mut counts = Vec::with_capacity(catalog::all().len());
        for resource in catalog::all() {
            counts.push((resource.name, self.repository.count(resource).await?));
        }
        Ok(counts)
    }

    /// Whether a stored image URL is still used by any record.
    pub async fn media_referenced(&self, url: &str) -> Result<bool, AppError> {
        self.repository.media_referenced(url).await
    }

    /// Checks database connectivity.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }

    async fn load(&self, resource: &'static ResourceDef, id: i64) -> Result<Record, AppError> {
        let record = self
            .repository
            .find_by_id(resource, id)
            .await?
            .ok_or_else(|| not_found(resource, id))?;

        let mut records = vec![record];
        self.attach_includes(resource, &mut records).await?;
        Ok(records.remove(0))
    }

    async fn find_by_slugified(
        &self,
        resource: &'static ResourceDef,
        slug_from: &str,
        requested: &str,
    ) -> Result<Option<Record>, AppError> {
        let target = slugify(requested);
        if target.is_empty() {
            return Ok(None);
        }

        let records = self
            .repository
            .list(resource, ListQuery::default())
            .await?;

        Ok(records.into_iter().find(|record| {
            record
                .get(slug_from)
                .and_then(Value::as_str)
                .is_some_and(|source| slugify(source) == target)
        }))
    }

    async fn unique_slug(
        &self,
        resource: &'static ResourceDef,
        base: &str,
    ) -> Result<String, AppError> {
        if base.is_empty() {
            return Err(AppError::bad_request(
                "Validation failed",
                json!({ "resource": resource.name, "fields": { "slug": "cannot be generated" } }),
            ));
        }

        for n in 1..=MAX_SLUG_ATTEMPTS {
            let slug = candidate(base, n);
            if self
                .repository
                .find_by_slug(resource, &slug)
                .await?
                .is_none()
            {
                return Ok(slug);
            }
        }

        Err(AppError::conflict(
            "Slug already exists",
            json!({ "resource": resource.name, "slug": base }),
        ))
    }

    /// Merges associations into `records` under each association key.
    ///
    /// `HasMany` and `ManyToMany` become arrays (empty when nothing is
    /// linked); `BelongsTo` becomes an object or `null`.
    async fn attach_includes(
        &self,
        resource: &'static ResourceDef,
        records: &mut [Record],
    ) -> Result<(), AppError> {
        if records.is_empty() {
            return Ok(());
        }

        for association in resource.associations {
            match association.kind {
                AssociationKind::HasMany { .. } | AssociationKind::ManyToMany { .. } => {
                    let owner_ids: Vec<i64> = records.iter().filter_map(record_id).collect();
                    let related = self
                        .repository
                        .fetch_related(resource, association, owner_ids)
                        .await?;

                    let mut grouped: HashMap<i64, Vec<Value>> = HashMap::new();
                    for item in related {
                        grouped
                            .entry(item.owner_id)
                            .or_default()
                            .push(Value::Object(item.record));
                    }

                    for record in records.iter_mut() {
                        let items = record_id(record)
                            .and_then(|id| grouped.remove(&id))
                            .unwrap_or_default();
                        record.insert(association.key.to_string(), Value::Array(items));
                    }
                }
                AssociationKind::BelongsTo { foreign_key } => {
                    let mut ids: Vec<i64> = records
                        .iter()
                        .filter_map(|r| r.get(foreign_key).and_then(Value::as_i64))
                        .collect();
                    ids.sort_unstable();
                    ids.dedup();

                    let related = self
                        .repository
                        .fetch_related(resource, association, ids)
                        .await?;

                    let by_id: HashMap<i64, Record> = related
                        .into_iter()
                        .map(|item| (item.owner_id, item.record))
                        .collect();

                    for record in records.iter_mut() {
                        let target = record
                            .get(foreign_key)
                            .and_then(Value::as_i64)
                            .and_then(|id| by_id.get(&id))
                            .map(|r| Value::Object(r.clone()))
                            .unwrap_or(Value::Null);
                        record.insert(association.key.to_string(), target);
                    }
                }
            }
        }

        Ok(())
    }
}

fn not_found(resource: &ResourceDef, id: i64) -> AppError {
    AppError::not_found(
        "Record not found",
        json!({ "resource": resource.name, "id": id }),
    )
}

fn validate_slug(slug: &str) -> Result<(), AppError> {
    if !is_valid_slug(slug) {
        return Err(AppError::bad_request(
            "Validation failed",
            json!({
                "fields": {
                    "slug": format!(
                        "must be lowercase letters and digits separated by single dashes (max {} chars)",
                        slug::MAX_SLUG_LENGTH
                    )
                }
            }),
        ));
    }
    Ok(())
}
