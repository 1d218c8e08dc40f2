//! PostgreSQL implementation of the content repository.
//!
//! Queries are assembled with [`sqlx::QueryBuilder`] from catalog identifiers;
//! every value is a bind parameter. Rows are returned as JSON objects via
//! `to_jsonb(t)` so one code path serves all resources.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::catalog::{self, Association, AssociationKind, FieldKind, ResourceDef};
use crate::domain::entities::{FieldValue, ListQuery, NewRecord, Record, RecordPatch, RelatedRecord};
use crate::domain::repositories::ContentRepository;
use crate::error::AppError;

/// PostgreSQL repository for catalog resources.
///
/// Deletes are hard deletes; dependent rows follow the foreign key rules in
/// the migrations (`CASCADE` for stats and join rows, `SET NULL` for workshops).
pub struct PgContentRepository {
    pool: Arc<PgPool>,
}

impl PgContentRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn select_from(resource: &ResourceDef) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT to_jsonb(t) AS record FROM ");
    builder.push(resource.name).push(" AS t");
    builder
}

fn field_kind(resource: &ResourceDef, column: &str) -> FieldKind {
    resource
        .field(column)
        .map(|f| f.kind)
        .unwrap_or(FieldKind::Text)
}

/// Binds a value; `NULL` is bound with the column's SQL type.
fn push_value(builder: &mut QueryBuilder<'static, Postgres>, kind: FieldKind, value: FieldValue) {
    match value {
        FieldValue::Text(s) => builder.push_bind(s),
        FieldValue::Integer(i) => builder.push_bind(i),
        FieldValue::Float(f) => builder.push_bind(f),
        FieldValue::Boolean(b) => builder.push_bind(b),
        FieldValue::Timestamp(ts) => builder.push_bind(ts),
        FieldValue::List(items) => builder.push_bind(items),
        FieldValue::Null => match kind {
            FieldKind::Integer | FieldKind::Reference(_) => builder.push_bind(None::<i64>),
            FieldKind::Float => builder.push_bind(None::<f64>),
            FieldKind::Boolean => builder.push_bind(None::<bool>),
            FieldKind::Timestamp => builder.push_bind(None::<DateTime<Utc>>),
            FieldKind::List => builder.push_bind(None::<Vec<String>>),
            FieldKind::Text
            | FieldKind::LongText
            | FieldKind::Email
            | FieldKind::Url
            | FieldKind::Image => builder.push_bind(None::<String>),
        },
    };
}

/// Replaces the join rows of one owner inside an open transaction.
async fn write_links(
    conn: &mut PgConnection,
    resource: &ResourceDef,
    association: &Association,
    owner_id: i64,
    related_ids: Vec<i64>,
) -> Result<(), AppError> {
    let AssociationKind::ManyToMany {
        join_table,
        local_key,
        remote_key,
        ..
    } = association.kind
    else {
        return Err(AppError::internal(
            "Association does not use a join table",
            serde_json::json!({ "resource": resource.name, "association": association.key }),
        ));
    };

    let mut delete = QueryBuilder::<Postgres>::new("DELETE FROM ");
    delete
        .push(join_table)
        .push(" WHERE ")
        .push(local_key)
        .push(" = ")
        .push_bind(owner_id);
    delete.build().execute(&mut *conn).await?;

    if !related_ids.is_empty() {
        let mut insert = QueryBuilder::<Postgres>::new("INSERT INTO ");
        insert
            .push(join_table)
            .push(" (")
            .push(local_key)
            .push(", ")
            .push(remote_key)
            .push(") SELECT ")
            .push_bind(owner_id)
            .push(", UNNEST(")
            .push_bind(related_ids)
            .push("::BIGINT[])");
        insert.build().execute(&mut *conn).await?;
    }

    Ok(())
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn list(
        &self,
        resource: &'static ResourceDef,
        query: ListQuery,
    ) -> Result<Vec<Record>, AppError> {
        let mut builder = select_from(resource);

        for (i, (column, value)) in query.filters.into_iter().enumerate() {
            builder
                .push(if i == 0 { " WHERE t." } else { " AND t." })
                .push(column)
                .push(" = ");
            push_value(&mut builder, field_kind(resource, column), value);
        }

        builder.push(" ORDER BY t.created_at DESC, t.id DESC");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ").push_bind(offset);
        }

        let rows = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(|Json(r)| r).collect())
    }

    async fn count(&self, resource: &'static ResourceDef) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        builder.push(resource.name);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn find_by_id(
        &self,
        resource: &'static ResourceDef,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        let mut builder = select_from(resource);
        builder.push(" WHERE t.id = ").push_bind(id);

        let row = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(|Json(r)| r))
    }

    async fn find_by_slug(
        &self,
        resource: &'static ResourceDef,
        slug: &str,
    ) -> Result<Option<Record>, AppError> {
        if !resource.has_slug() {
            return Ok(None);
        }

        let mut builder = select_from(resource);
        builder.push(" WHERE t.slug = ").push_bind(slug.to_string());

        let row = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(|Json(r)| r))
    }

    async fn create(
        &self,
        resource: &'static ResourceDef,
        record: NewRecord,
    ) -> Result<Record, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
        builder.push(resource.name).push(" AS t");

        if record.values.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            let columns: Vec<&'static str> = record.values.keys().copied().collect();
            builder.push(" (").push(columns.join(", ")).push(") VALUES (");

            for (i, (column, value)) in record.values.into_iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_value(&mut builder, field_kind(resource, column), value);
            }
            builder.push(")");
        }

        builder.push(" RETURNING to_jsonb(t) AS record");

        let Json(row) = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row)
    }

    async fn update(
        &self,
        resource: &'static ResourceDef,
        id: i64,
        patch: RecordPatch,
    ) -> Result<Option<Record>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
        builder.push(resource.name).push(" AS t SET ");

        for (column, value) in patch.values {
            builder.push(column).push(" = ");
            push_value(&mut builder, field_kind(resource, column), value);
            builder.push(", ");
        }

        builder
            .push("updated_at = NOW() WHERE t.id = ")
            .push_bind(id)
            .push(" RETURNING to_jsonb(t) AS record");

        let mut tx = self.pool.begin().await?;

        let Some(Json(row)) = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        for (key, related_ids) in patch.links {
            let association = resource.association(key).ok_or_else(|| {
                AppError::internal(
                    "Unknown association",
                    serde_json::json!({ "resource": resource.name, "association": key }),
                )
            })?;
            write_links(&mut tx, resource, association, id, related_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(row))
    }

    async fn delete(
        &self,
        resource: &'static ResourceDef,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder
            .push(resource.name)
            .push(" AS t WHERE t.id = ")
            .push_bind(id)
            .push(" RETURNING to_jsonb(t) AS record");

        let row = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(|Json(r)| r))
    }

    async fn fetch_related(
        &self,
        _resource: &'static ResourceDef,
        association: &'static Association,
        owner_ids: Vec<i64>,
    ) -> Result<Vec<RelatedRecord>, AppError> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");

        match association.kind {
            AssociationKind::HasMany { foreign_key } => {
                builder
                    .push("t.")
                    .push(foreign_key)
                    .push(" AS owner_id, to_jsonb(t) AS record FROM ")
                    .push(association.target)
                    .push(" AS t WHERE t.")
                    .push(foreign_key)
                    .push(" = ANY(")
                    .push_bind(owner_ids)
                    .push(")");
            }
            AssociationKind::BelongsTo { .. } => {
                builder
                    .push("t.id AS owner_id, to_jsonb(t) AS record FROM ")
                    .push(association.target)
                    .push(" AS t WHERE t.id = ANY(")
                    .push_bind(owner_ids)
                    .push(")");
            }
            AssociationKind::ManyToMany {
                join_table,
                local_key,
                remote_key,
                ..
            } => {
                builder
                    .push("j.")
                    .push(local_key)
                    .push(" AS owner_id, to_jsonb(t) AS record FROM ")
                    .push(association.target)
                    .push(" AS t JOIN ")
                    .push(join_table)
                    .push(" AS j ON j.")
                    .push(remote_key)
                    .push(" = t.id WHERE j.")
                    .push(local_key)
                    .push(" = ANY(")
                    .push_bind(owner_ids)
                    .push(")");
            }
        }

        builder.push(" ORDER BY t.created_at DESC, t.id DESC");

        let rows = builder
            .build_query_as::<(i64, Json<Record>)>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(owner_id, Json(record))| RelatedRecord { owner_id, record })
            .collect())
    }

    async fn replace_links(
        &self,
        resource: &'static ResourceDef,
        association: &'static Association,
        owner_id: i64,
        related_ids: Vec<i64>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        write_links(&mut tx, resource, association, owner_id, related_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn media_referenced(&self, url: &str) -> Result<bool, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT EXISTS (");
        let mut first = true;

        for resource in catalog::all() {
            for field in resource.image_fields() {
                if !first {
                    builder.push(" UNION ALL ");
                }
                first = false;
                builder
                    .push("SELECT 1 FROM ")
                    .push(resource.name)
                    .push(" WHERE ")
                    .push(field.name)
                    .push(" = ")
                    .push_bind(url.to_string());
            }
        }

        if first {
            return Ok(false);
        }
        builder.push(")");

        let referenced = builder
            .build_query_scalar::<bool>()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(referenced)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
