//! Query filter parameters shared by list and search endpoints.

use crate::envelope::Pagination;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size when the client does not supply one.
pub const DEFAULT_QUERY_FILTER_LIMIT: u16 = 50;

/// Hard cap on the page size, regardless of what the client asks for.
pub const MAX_QUERY_FILTER_LIMIT: u16 = 250;

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Asc,
    Desc,
}

/// The closed set of pagination and filter query parameters.
///
/// Every list and search endpoint accepts exactly these; search endpoints
/// additionally require `q`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub limit: Option<u16>,
    pub page: Option<u16>,
    pub created_before: Option<DateTime<Utc>>,
    pub created_after: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,
    pub updated_after: Option<DateTime<Utc>>,
    pub include_archived: Option<bool>,
    pub sort_by: Option<SortBy>,
    pub q: Option<String>,
}

impl QueryFilter {
    /// Effective page size: defaulted, then clamped to the maximum.
    pub fn limit(&self) -> u16 {
        self.limit
            .unwrap_or(DEFAULT_QUERY_FILTER_LIMIT)
            .min(MAX_QUERY_FILTER_LIMIT)
    }

    /// Effective 1-based page number.
    pub fn page(&self) -> u16 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn include_archived(&self) -> bool {
        self.include_archived.unwrap_or(false)
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by.unwrap_or_default()
    }

    /// Whether a timestamped row passes the created/updated range bounds.
    pub fn matches_timestamps(
        &self,
        created_at: DateTime<Utc>,
        last_updated_at: Option<DateTime<Utc>>,
    ) -> bool {
        if let Some(bound) = self.created_before {
            if created_at >= bound {
                return false;
            }
        }
        if let Some(bound) = self.created_after {
            if created_at <= bound {
                return false;
            }
        }
        if self.updated_before.is_some() || self.updated_after.is_some() {
            let Some(updated) = last_updated_at else {
                return false;
            };
            if let Some(bound) = self.updated_before {
                if updated >= bound {
                    return false;
                }
            }
            if let Some(bound) = self.updated_after {
                if updated <= bound {
                    return false;
                }
            }
        }
        true
    }

    /// Pagination block reflecting this filter and the result counts.
    pub fn pagination(&self, filtered: u64, total_count: u64) -> Pagination {
        Pagination {
            limit: self.limit(),
            page: self.page(),
            filtered,
            total_count,
        }
    }
}
