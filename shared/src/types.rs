//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// SQL offset for this page
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.limit()
    }

    /// SQL limit, capped to keep responses bounded
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, 100) as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, per_page: u32, total_items: i64) -> Self {
        let total_items = total_items.max(0) as u64;
        let per_page = per_page.clamp(1, 100);
        let total_pages = total_items.div_ceil(per_page as u64) as u32;
        Self {
            page: page.max(1),
            per_page,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination {
            page: 0,
            per_page: 500,
        };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 100);

        let p = Pagination {
            page: 3,
            per_page: 10,
        };
        assert_eq!(p.offset(), 20);
    }
}
