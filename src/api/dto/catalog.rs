//! DTOs for the catalog endpoint.

use serde::Serialize;

use crate::domain::catalog::{Association, FieldDef, ResourceDef, Visibility};

/// `GET /api/catalog` response.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub resources: Vec<ResourceItem>,
}

/// Public description of one resource.
#[derive(Debug, Serialize)]
pub struct ResourceItem {
    pub name: &'static str,
    pub visibility: Visibility,
    pub slug_from: Option<&'static str>,
    pub fields: &'static [FieldDef],
    pub associations: &'static [Association],
}

impl From<&'static ResourceDef> for ResourceItem {
    fn from(r: &'static ResourceDef) -> Self {
        Self {
            name: r.name,
            visibility: r.visibility,
            slug_from: r.slug_from,
            fields: r.fields,
            associations: r.associations,
        }
    }
}
