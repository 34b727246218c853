//! # Paginator
//! Pure page arithmetic over an already-fetched record count. No I/O.
//!
//! The caller owns "current page"; these helpers only clamp it and derive
//! offsets and navigation bounds.

use serde::{Deserialize, Serialize};

/// `max(1, ceil(total_count / per_page))`. `per_page == 0` is treated as 1.
pub fn total_pages(total_count: u64, per_page: u32) -> u32 {
    let per = u64::from(per_page.max(1));
    let pages = total_count.div_ceil(per).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `[1, total_pages]`.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Row offset of the first record on `page` (1-based).
pub fn offset_for(page: u32, per_page: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(per_page.max(1))
}

/// Requested page + page size. Both are at least 1 once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub per_page: u32,
}

impl PageQuery {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }
}

/// Bounds for first / previous / next / last navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageNav {
    pub page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub first: u32,
    pub last: u32,
}

impl PageNav {
    pub fn new(page: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        let page = clamp_page(page, total_pages);
        Self {
            page,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
            first: 1,
            last: total_pages,
        }
    }

    pub fn prev(&self) -> u32 {
        if self.has_prev {
            self.page - 1
        } else {
            self.page
        }
    }

    pub fn next(&self) -> u32 {
        if self.has_next {
            self.page + 1
        } else {
            self.page
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_matches_reference_values() {
        assert_eq!(total_pages(0, 5), 1);
        assert_eq!(total_pages(12, 5), 3);
        assert_eq!(total_pages(10, 5), 2);
        assert_eq!(total_pages(1, 5), 1);
        assert_eq!(total_pages(7, 0), 7);
    }

    #[test]
    fn clamp_and_offset() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(9, 3), 3);
        assert_eq!(clamp_page(2, 0), 1);
        assert_eq!(offset_for(1, 5), 0);
        assert_eq!(offset_for(3, 5), 10);
        assert_eq!(offset_for(0, 5), 0);
    }

    #[test]
    fn nav_bounds() {
        let n = PageNav::new(1, 3);
        assert!(!n.has_prev && n.has_next);
        assert_eq!((n.prev(), n.next(), n.last), (1, 2, 3));

        let n = PageNav::new(5, 3);
        assert_eq!(n.page, 3);
        assert!(n.has_prev && !n.has_next);
        assert_eq!(n.next(), 3);

        let single = PageNav::new(1, 1);
        assert!(!single.has_prev && !single.has_next);
    }

    #[test]
    fn page_query_normalizes_zeroes() {
        assert_eq!(PageQuery::new(0, 0), PageQuery { page: 1, per_page: 1 });
    }
}
