//! Listing
//!
//! Search and pagination state owned by a single view. Filtering happens on the
//! client over data already fetched.

use serde::{Deserialize, Serialize};

use crate::items::LineItem;

/// Default number of rows per page.
pub const DEFAULT_PER_PAGE: usize = 10;

/// Something a free-text search can match.
pub trait Searchable {
    /// Whether `needle` (already lowercased, non-empty) matches this value.
    fn matches(&self, needle: &str) -> bool;
}

impl<T: Searchable + ?Sized> Searchable for &T {
    fn matches(&self, needle: &str) -> bool {
        (**self).matches(needle)
    }
}

impl Searchable for LineItem {
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.product_id.to_lowercase().contains(needle)
            || self.id.as_str().to_lowercase().contains(needle)
    }
}

/// Search text and page position of one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    /// Case-insensitive search text; blank matches everything
    pub search: Option<String>,

    /// 1-based page number
    pub page: usize,

    /// Rows per page
    pub per_page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,

    /// 1-based page number actually served
    pub page: usize,

    /// Number of pages (at least 1)
    pub total_pages: usize,

    /// Number of rows matching the search
    pub total_items: usize,
}

impl ListQuery {
    /// Set the search text and go back to the first page.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self.page = 1;
        self
    }

    /// Set the page number.
    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Filter `items` and cut out the requested page.
    ///
    /// A page of zero is treated as the first page, a page past the end as the
    /// last one, and a page size of zero as one row.
    pub fn apply<T: Searchable>(&self, items: impl IntoIterator<Item = T>) -> Page<T> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<T> = items
            .into_iter()
            .filter(|item| needle.as_deref().is_none_or(|needle| item.matches(needle)))
            .collect();

        let per_page = self.per_page.max(1);
        let total_items = matching.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = self.page.clamp(1, total_pages);

        let items = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Page {
            items,
            page,
            total_pages,
            total_items,
        }
    }
}
