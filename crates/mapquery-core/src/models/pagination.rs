//! Pagination descriptor and page-list derivation.

use serde::{Deserialize, Serialize};

/// Default number of features per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pages shown on each side of the current page in a page list
const PAGE_WINDOW: u32 = 2;

/// Position within a paged result set.
///
/// Always built through [`PaginationDescriptor::new`], which derives
/// `total_pages` and `has_more` so that
/// `total_pages == max(1, ceil(total_features / page_size))` and
/// `has_more == (page < total_pages)` hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDescriptor {
    pub page: u32,
    pub page_size: u32,
    pub total_features: u64,
    pub total_pages: u32,
    pub has_more: bool,
}

impl PaginationDescriptor {
    /// Build a descriptor; `page` and `page_size` are clamped to at least 1
    pub fn new(page: u32, page_size: u32, total_features: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages_for(total_features, page_size);
        let page = page.max(1);
        Self { page, page_size, total_features, total_pages, has_more: page < total_pages }
    }

    /// Single empty page, shown before any query and after a clear
    pub fn empty(page_size: u32) -> Self {
        Self::new(1, page_size, 0)
    }

    /// Same result set, positioned on another page
    pub fn at_page(&self, page: u32) -> Self {
        Self::new(page, self.page_size, self.total_features)
    }

    /// Whether `page` addresses an existing page
    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    /// Whether the full result set exceeds a single page
    pub fn needs_server_paging(&self) -> bool {
        self.total_features > u64::from(self.page_size)
    }

    pub fn can_go_previous(&self) -> bool {
        self.page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.has_more
    }
}

impl Default for PaginationDescriptor {
    fn default() -> Self {
        Self::empty(DEFAULT_PAGE_SIZE)
    }
}

/// `max(1, ceil(total / page_size))`
pub fn total_pages_for(total_features: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_features.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Entry in a rendered page list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl std::fmt::Display for PageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{}", n),
            PageItem::Ellipsis => f.write_str("..."),
        }
    }
}

/// Page numbers to display for `current` out of `total_pages`.
///
/// Always includes the first and last page and up to two pages either side of
/// the current one, with an ellipsis wherever numbers are skipped.
pub fn page_numbers(current: u32, total_pages: u32) -> Vec<PageItem> {
    let total = total_pages.max(1);
    let current = current.clamp(1, total);

    let start = current.saturating_sub(PAGE_WINDOW).max(1);
    let end = current.saturating_add(PAGE_WINDOW).min(total);

    let mut pages = vec![1];
    pages.extend(start..=end);
    pages.push(total);
    pages.sort_unstable();
    pages.dedup();

    let mut items = Vec::with_capacity(pages.len() + 2);
    let mut previous: Option<u32> = None;
    for page in pages {
        if let Some(prev) = previous {
            if page > prev + 1 {
                items.push(PageItem::Ellipsis);
            }
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}
