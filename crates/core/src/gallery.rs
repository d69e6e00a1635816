//! Paging arithmetic for the project gallery.

/// Projects shown per gallery page.
pub const DEFAULT_PER_PAGE: usize = 6;

/// Number of pages needed for `total` items (0 when there are none).
pub fn total_pages(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Slice bounds `(start, end)` for 1-based `page`, clamped to `total`.
///
/// Pages past the end produce an empty window rather than an error.
pub fn page_window(total: usize, page: usize, per_page: usize) -> (usize, usize) {
    let start = page.saturating_sub(1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);
    (start, end)
}
