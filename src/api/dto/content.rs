//! Query parameters for content list endpoints.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use std::collections::HashMap;
use validator::Validate;

use crate::domain::catalog::ResourceDef;
use crate::domain::entities::ListQuery;
use crate::domain::input::parse_filters;
use crate::error::AppError;

/// Page size used when only `page` is given.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// `GET /api/{resource}` query string.
///
/// Every key other than `page` and `page_size` is an equality filter,
/// e.g. `?featured=true&center_id=3`.
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: Option<u32>,

    #[serde(flatten)]
    pub filters: HashMap<String, String>,
}

impl ListParams {
    /// Converts validated parameters into a repository query.
    ///
    /// Without `page` and `page_size` the whole list is returned.
    pub fn into_list_query(self, resource: &ResourceDef) -> Result<ListQuery, AppError> {
        let filters = parse_filters(resource, &self.filters)?;

        let (offset, limit) = match (self.page, self.page_size) {
            (None, None) => (None, None),
            (page, size) => {
                let page = i64::from(page.unwrap_or(1));
                let size = i64::from(size.unwrap_or(DEFAULT_PAGE_SIZE));
                (Some((page - 1) * size), Some(size))
            }
        };

        Ok(ListQuery {
            offset,
            limit,
            filters,
        })
    }
}
