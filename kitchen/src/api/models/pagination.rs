//! Shared pagination types.
//!
//! Two styles are in use:
//! - The HTML list views are page-numbered ([`Page`]), five rows per page by default. Asking for
//!   a page past the end returns the last page instead of an error.
//! - The admin API uses offset-based pagination with `skip` and `limit` ([`Pagination`]).

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per admin API page.
pub const DEFAULT_LIMIT: i64 = 100;

/// Maximum number of items that can be requested per admin API page.
pub const MAX_LIMIT: i64 = 500;

/// Standard pagination parameters for admin API list endpoints.
///
/// The `limit` is clamped to ensure it's always between 1 and [`MAX_LIMIT`].
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 100, max: 500)
    #[param(default = 100, minimum = 1, maximum = 500)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the skip value, defaulting to 0 if not specified.
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Get both skip and limit as a tuple, useful for destructuring.
    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// Generic paginated response wrapper for admin list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    /// The items for the current page
    pub data: Vec<T>,
    /// Total number of items matching the query (before pagination)
    pub total_count: i64,
    /// Number of items skipped
    pub skip: i64,
    /// Maximum items returned per page
    pub limit: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        Self {
            data,
            total_count,
            skip,
            limit,
        }
    }
}

/// Parse the `page` query value of a list view. Anything that is not a positive integer
/// means the first page.
pub fn requested_page(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok()).filter(|p| *p >= 1).unwrap_or(1)
}

/// One page of a page-numbered list, already clamped to the pages that exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total_count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<i64>,
    pub next_page_number: Option<i64>,
    /// More than one page exists.
    pub is_paginated: bool,
}

impl Page {
    /// Resolve `requested` against `total_count` rows. An empty list still has one page.
    pub fn clamp(requested: i64, total_count: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let total_count = total_count.max(0);
        let num_pages = ((total_count + per_page - 1) / per_page).max(1);
        let number = requested.clamp(1, num_pages);

        Self {
            number,
            num_pages,
            per_page,
            total_count,
            has_previous: number > 1,
            has_next: number < num_pages,
            previous_page_number: (number > 1).then_some(number - 1),
            next_page_number: (number < num_pages).then_some(number + 1),
            is_paginated: num_pages > 1,
        }
    }

    /// Rows to skip to reach this page.
    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}
