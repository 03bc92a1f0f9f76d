//! Pagination types for the user listing

use serde::{Deserialize, Serialize};

/// Fixed number of rows per listing page
pub const PAGE_SIZE: u32 = 5;

/// A requested page (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
}

impl Pagination {
    /// Create pagination, clamping the page to a minimum of 1.
    pub fn new(page: u32) -> Self {
        Self { page: page.max(1) }
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(PAGE_SIZE)
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(PAGE_SIZE)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1 }
    }
}

/// One page of rows plus the size of the full match set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Rows on the requested page
    pub items: Vec<T>,
    /// Matching users across all pages
    pub total: i64,
    /// Requested page number
    pub page: u32,
}

impl<T> Paginated<T> {
    /// Number of pages needed for `total` rows.
    ///
    /// An empty match set has zero pages.
    pub fn total_pages(&self) -> i64 {
        let per_page = i64::from(PAGE_SIZE);
        (self.total.max(0) + per_page - 1) / per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginated(total: i64) -> Paginated<()> {
        Paginated {
            items: vec![],
            total,
            page: 1,
        }
    }

    #[test]
    fn offset_calculation() {
        assert_eq!(Pagination::new(1).offset(), 0);
        assert_eq!(Pagination::new(2).offset(), 5);
        assert_eq!(Pagination::new(4).offset(), 15);
        assert_eq!(Pagination::new(3).limit(), 5);
    }

    #[test]
    fn clamps_page() {
        assert_eq!(Pagination::new(0).page, 1);
        assert_eq!(Pagination::default(), Pagination::new(1));
    }

    #[test]
    fn large_page_does_not_overflow() {
        let p = Pagination::new(u32::MAX);
        assert_eq!(p.offset(), (i64::from(u32::MAX) - 1) * 5);
    }

    #[test]
    fn total_pages() {
        assert_eq!(paginated(0).total_pages(), 0);
        assert_eq!(paginated(1).total_pages(), 1);
        assert_eq!(paginated(5).total_pages(), 1);
        assert_eq!(paginated(6).total_pages(), 2);
        assert_eq!(paginated(12).total_pages(), 3);
    }
}
