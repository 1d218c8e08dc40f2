//! Repository trait for catalog-driven content storage.

use crate::domain::catalog::{Association, ResourceDef};
use crate::domain::entities::{ListQuery, NewRecord, Record, RecordPatch, RelatedRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for every content resource in the catalog.
///
/// Methods take the [`ResourceDef`] to operate on, so a single implementation
/// serves all resources.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgContentRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_content.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Lists records, newest first (`created_at DESC, id DESC`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(
        &self,
        resource: &'static ResourceDef,
        query: ListQuery,
    ) -> Result<Vec<Record>, AppError>;

    /// Counts all records of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self, resource: &'static ResourceDef) -> Result<i64, AppError>;

    /// Finds a record by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(
        &self,
        resource: &'static ResourceDef,
        id: i64,
    ) -> Result<Option<Record>, AppError>;

    /// Finds a record by its exact slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_slug(
        &self,
        resource: &'static ResourceDef,
        slug: &str,
    ) -> Result<Option<Record>, AppError>;

    /// Inserts a record and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] on unique violations (e.g. duplicate slug).
    /// Returns [`AppError::Validation`] on foreign key or not-null violations.
    /// Returns [`AppError::Internal`] on other database errors.
    async fn create(
        &self,
        resource: &'static ResourceDef,
        record: NewRecord,
    ) -> Result<Record, AppError>;

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// The column update and the replacement of every link set in
    /// `patch.links` run in one transaction. Returns `None` if no row has
    /// this id.
    ///
    /// # Errors
    ///
    /// Same as [`ContentRepository::create`].
    async fn update(
        &self,
        resource: &'static ResourceDef,
        id: i64,
        patch: RecordPatch,
    ) -> Result<Option<Record>, AppError>;

    /// Hard-deletes a record and returns the removed row.
    ///
    /// Returns `None` if no row has this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(
        &self,
        resource: &'static ResourceDef,
        id: i64,
    ) -> Result<Option<Record>, AppError>;

    /// Loads associated rows for a set of owners.
    ///
    /// For `BelongsTo` associations `owner_ids` are the referenced ids and
    /// each result's `owner_id` is the target row's own id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn fetch_related(
        &self,
        resource: &'static ResourceDef,
        association: &'static Association,
        owner_ids: Vec<i64>,
    ) -> Result<Vec<RelatedRecord>, AppError>;

    /// Replaces the many-to-many link set of one owner in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if a related id does not exist.
    /// Returns [`AppError::Internal`] on other database errors.
    async fn replace_links(
        &self,
        resource: &'static ResourceDef,
        association: &'static Association,
        owner_id: i64,
        related_ids: Vec<i64>,
    ) -> Result<(), AppError>;

    /// Whether any image field of any resource still holds `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn media_referenced(&self, url: &str) -> Result<bool, AppError>;

    /// Checks database connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the database is unreachable.
    async fn ping(&self) -> Result<(), AppError>;
}
