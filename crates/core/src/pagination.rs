//! Pagination window and page state for list views.
//!
//! [`compute_range`] produces the bounded, ellipsis-compressed run of page
//! tokens shown around the current page. The first and last pages are always
//! present and the run never exceeds `2 * sibling_count + 5` tokens.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Pages shown on each side of the current page.
pub const DEFAULT_SIBLING_COUNT: usize = 1;

/// Questions per dashboard page.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Largest accepted page size.
pub const MAX_ITEMS_PER_PAGE: usize = 100;

/// Largest sibling count accepted from configuration.
pub const MAX_SIBLING_COUNT: usize = 10;

// ---------------------------------------------------------------------------
// Range computation
// ---------------------------------------------------------------------------

/// One slot in the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageToken {
    Page(usize),
    Ellipsis,
}

/// Compute the page tokens to display.
///
/// `total_pages` below 1 is treated as 1 and `current_page` is clamped into
/// `1..=total_pages`.
///
/// ```
/// use qaforum_core::pagination::{compute_range, PageToken::*};
/// assert_eq!(
///     compute_range(5, 10, 1),
///     vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
/// );
/// ```
pub fn compute_range(
    current_page: usize,
    total_pages: usize,
    sibling_count: usize,
) -> Vec<PageToken> {
    let total = total_pages.max(1);
    let current = current_page.clamp(1, total);

    let window = sibling_count.saturating_mul(2).saturating_add(5);
    if total <= window {
        return pages(1, total);
    }

    let left_sibling = current.saturating_sub(sibling_count).max(1);
    let right_sibling = current.saturating_add(sibling_count).min(total);

    let show_left_ellipsis = left_sibling > 2;
    let show_right_ellipsis = right_sibling < total - 1;

    // Width of the contiguous block next to an edge when only one side collapses.
    let edge_block = sibling_count.saturating_mul(2).saturating_add(3);

    match (show_left_ellipsis, show_right_ellipsis) {
        (false, false) => pages(1, total),
        (false, true) => {
            let mut tokens = pages(1, edge_block);
            tokens.push(PageToken::Ellipsis);
            tokens.push(PageToken::Page(total));
            tokens
        }
        (true, false) => {
            let mut tokens = vec![PageToken::Page(1), PageToken::Ellipsis];
            tokens.extend(pages(total - edge_block + 1, total));
            tokens
        }
        (true, true) => {
            let mut tokens = vec![PageToken::Page(1), PageToken::Ellipsis];
            tokens.extend(pages(left_sibling, right_sibling));
            tokens.push(PageToken::Ellipsis);
            tokens.push(PageToken::Page(total));
            tokens
        }
    }
}

fn pages(from: usize, to: usize) -> Vec<PageToken> {
    (from..=to).map(PageToken::Page).collect()
}

// ---------------------------------------------------------------------------
// Page state
// ---------------------------------------------------------------------------

/// Pagination state handed to the pagination controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub current_page: usize,
    pub total_pages: usize,
    pub items_per_page: usize,
    pub tokens: Vec<PageToken>,
}

impl PageState {
    /// Build the state for a list of `total_items`, clamping the requested
    /// page and page size to valid bounds.
    pub fn new(
        total_items: usize,
        items_per_page: usize,
        requested_page: usize,
        sibling_count: usize,
    ) -> Self {
        let items_per_page = clamp_items_per_page(items_per_page);
        let total_pages = total_items.div_ceil(items_per_page).max(1);
        let current_page = requested_page.clamp(1, total_pages);

        Self {
            current_page,
            total_pages,
            items_per_page,
            tokens: compute_range(current_page, total_pages, sibling_count),
        }
    }

    /// Index range of the items on the current page within a list of `len`.
    pub fn item_range(&self, len: usize) -> std::ops::Range<usize> {
        let start = ((self.current_page - 1) * self.items_per_page).min(len);
        let end = start.saturating_add(self.items_per_page).min(len);
        start..end
    }

    /// The items on the current page.
    pub fn page_slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.item_range(items.len())]
    }
}

/// Clamp a page size to `1..=MAX_ITEMS_PER_PAGE`.
pub fn clamp_items_per_page(items_per_page: usize) -> usize {
    items_per_page.clamp(1, MAX_ITEMS_PER_PAGE)
}

/// Clamp a sibling count to `0..=MAX_SIBLING_COUNT`.
pub fn clamp_sibling_count(sibling_count: usize) -> usize {
    sibling_count.min(MAX_SIBLING_COUNT)
}
