//! Page/page-size pagination for log group listings.

use serde::Serialize;

/// Page size used when the caller gives none.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size accepted.
pub const MAX_PAGE_SIZE: i64 = 500;

/// A validated page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    /// Clamp raw query values into the accepted bounds.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip. Saturates for pages far past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Page metadata for a result set of `total` rows.
    pub fn info(&self, total: i64) -> PageInfo {
        let total_pages = if total == 0 {
            0
        } else {
            (total + self.page_size - 1) / self.page_size
        };
        PageInfo {
            page: self.page,
            page_size: self.page_size,
            total,
            total_pages,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}
