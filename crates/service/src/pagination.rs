//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct, helpers to normalize inputs and a
//! `Page<T>` result carrying the totals the dashboard renders.

use serde::Serialize;

/// Upper bound on `per_page`; the dashboard asks for `limit=1000` to fetch everything.
pub const MAX_PER_PAGE: u32 = 1000;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        let d = Self::default();
        Self { page: page.unwrap_or(d.page), per_page: per_page.unwrap_or(d.per_page) }
    }

    /// Clamp to sane defaults and convert to `(page_index, per_page)` as `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        ((page - 1) as u64, per_page as u64)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Cut one page out of an already filtered and ordered list.
    pub fn from_items(all: Vec<T>, pagination: Pagination) -> Self {
        let (idx, per_page) = pagination.normalize();
        let total = all.len() as u64;
        let total_pages = total.div_ceil(per_page);
        let items = all
            .into_iter()
            .skip((idx * per_page) as usize)
            .take(per_page as usize)
            .collect();
        Self { items, total, page: idx + 1, per_page, total_pages }
    }
}
