//! Page-based pagination for list endpoints.
//!
//! Every list endpoint accepts `page` (1-indexed) and `limit`, and answers with
//! a `{ data, meta }` envelope. Each endpoint picks its own default `limit`;
//! the effective value is always clamped to `[1, 100]`.
//!
//! # Example
//!
//! ```ignore
//! use classhero_core::pagination::{PaginationParams, PaginationMeta};
//!
//! let limit = params.limit_or(20);
//! let offset = params.offset_for(limit);
//!
//! let rows = fetch_page(limit, offset).await?;
//! let total = count_rows().await?;
//!
//! let meta = PaginationMeta::new(total, params.page(), limit);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::serde::deserialize_optional_i64;

/// Upper bound applied to every requested page size.
pub const MAX_LIMIT: i64 = 100;

/// Metadata about a paginated response.
///
/// ```json
/// {
///   "data": [...],
///   "meta": { "total": 42, "limit": 10, "page": 2, "total_pages": 5, "has_more": true }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Items per page (the limit that was applied)
    pub limit: i64,
    /// Current page number
    pub page: i64,
    /// Number of pages for `total` items at `limit` per page
    pub total_pages: i64,
    /// Whether there are more pages after this one
    pub has_more: bool,
}

impl PaginationMeta {
    #[must_use]
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        let total = total.max(0);
        let total_pages = (total + limit - 1) / limit;

        Self {
            total,
            limit,
            page,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

/// Query parameters for pagination.
///
/// Empty values (`?page=`) are treated as absent.
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default depends on the endpoint)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    /// Returns the page number, clamped to a minimum of 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Returns the requested limit or `default`, clamped to `[1, MAX_LIMIT]`.
    #[must_use]
    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip for the current page at the given limit.
    ///
    /// Saturates at `i64::MAX` so very large pages yield an empty result.
    #[must_use]
    pub fn offset_for(&self, limit: i64) -> i64 {
        (self.page() - 1).saturating_mul(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit_or(20), 20);
        assert_eq!(params.offset_for(20), 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        let params = PaginationParams {
            page: None,
            limit: Some(1000),
        };
        assert_eq!(params.limit_or(10), MAX_LIMIT);

        let params = PaginationParams {
            page: None,
            limit: Some(0),
        };
        assert_eq!(params.limit_or(10), 1);

        let params = PaginationParams {
            page: None,
            limit: Some(-5),
        };
        assert_eq!(params.limit_or(10), 1);
    }

    #[test]
    fn test_page_is_clamped() {
        let params = PaginationParams {
            page: Some(0),
            limit: None,
        };
        assert_eq!(params.page(), 1);

        let params = PaginationParams {
            page: Some(-3),
            limit: None,
        };
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn test_offset_from_page() {
        let params = PaginationParams {
            page: Some(3),
            limit: Some(10),
        };
        let limit = params.limit_or(20);
        assert_eq!(params.offset_for(limit), 20);
    }

    #[test]
    fn test_offset_saturates_for_huge_page() {
        let params = PaginationParams {
            page: Some(i64::MAX),
            limit: Some(50),
        };
        let limit = params.limit_or(20);
        assert_eq!(params.offset_for(limit), i64::MAX);
    }

    #[test]
    fn test_meta_total_pages_rounds_up() {
        let meta = PaginationMeta::new(41, 1, 10);
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_more);
    }

    #[test]
    fn test_meta_last_page_has_no_more() {
        let meta = PaginationMeta::new(40, 4, 10);
        assert_eq!(meta.total_pages, 4);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_meta_empty_result() {
        let meta = PaginationMeta::new(0, 1, 10);
        assert_eq!(meta.total, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_meta_serialization() {
        let meta = PaginationMeta::new(25, 2, 10);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["total"], 25);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["page"], 2);
        assert_eq!(json["total_pages"], 3);
        assert_eq!(json["has_more"], true);
    }

    #[test]
    fn test_params_from_query_string_with_empty_values() {
        let params: PaginationParams = serde_json::from_str(r#"{"page":"","limit":"15"}"#).unwrap();
        assert_eq!(params.page, None);
        assert_eq!(params.limit, Some(15));
    }
}
