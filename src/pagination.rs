//! This module defines the common functionality for paging the transaction
//! history.
//!
//! Pages are numbered from 1. A requested page that points past either end of
//! the history is clamped rather than rejected, so a delete that empties the
//! last page lands the user on the previous valid page instead of an empty
//! one.

use std::ops::Range;

/// The config for pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions to display per page.
    pub page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            page_size: 5,
        }
    }
}

/// The number of pages needed to show `total` items at `page_size` items per
/// page. The empty history has zero pages.
pub fn page_count(total: usize, page_size: u64) -> u64 {
    (total as u64).div_ceil(page_size)
}

/// Clamp `requested` to a valid page number in `[1, page_count]`.
///
/// An empty history (zero pages) clamps to page 1 so that callers always have
/// a current page to display.
pub fn clamp_page(requested: u64, page_count: u64) -> u64 {
    requested.clamp(1, page_count.max(1))
}

/// The index range of the items shown on `page`, clipped to `total`.
///
/// `page` must already be clamped; out-of-range pages yield an empty range.
pub fn page_window(total: usize, page: u64, page_size: u64) -> Range<usize> {
    let start = (page.saturating_sub(1) * page_size) as usize;
    let end = (page * page_size) as usize;

    start.min(total)..end.min(total)
}

#[cfg(test)]
mod pagination_tests {
    use super::{clamp_page, page_count, page_window};

    #[test]
    fn page_count_is_ceiling_of_total_over_page_size() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(1, 5), 1);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);
        assert_eq!(page_count(11, 5), 3);
    }

    #[test]
    fn clamp_page_is_identity_for_valid_pages() {
        assert_eq!(clamp_page(1, 3), 1);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(3, 3), 3);
    }

    #[test]
    fn clamp_page_snaps_to_nearest_boundary() {
        // Navigating below page 1 or past the last page is a no-op in the UI;
        // a stale page number from the query string snaps to the last page.
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(4, 3), 3);
        assert_eq!(clamp_page(100, 3), 3);
    }

    #[test]
    fn clamp_page_on_empty_history_is_page_one() {
        assert_eq!(clamp_page(1, 0), 1);
        assert_eq!(clamp_page(7, 0), 1);
    }

    #[test]
    fn page_window_slices_the_history() {
        assert_eq!(page_window(12, 1, 5), 0..5);
        assert_eq!(page_window(12, 2, 5), 5..10);
        assert_eq!(page_window(12, 3, 5), 10..12);
    }

    #[test]
    fn page_window_is_empty_for_empty_history() {
        assert_eq!(page_window(0, 1, 5), 0..0);
    }
}
