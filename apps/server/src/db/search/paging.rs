//! Pagination parameters and result pages.

use serde::Serialize;

use crate::models::Record;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Requested page, already clamped: `page >= 1`, `per_page` in `[1, MAX_PER_PAGE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.clamp(1, u32::MAX as i64) as u32,
            per_page: per_page.clamp(1, MAX_PER_PAGE as i64) as u32,
        }
    }

    /// Lenient parsing of caller input: missing or non-numeric values fall back
    /// to the defaults instead of failing.
    pub fn from_query(page: Option<&str>, per_page: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: u32| {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default as i64)
        };
        Self::new(
            parse(page, DEFAULT_PAGE),
            parse(per_page, DEFAULT_PER_PAGE),
        )
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Resolve the window for a result set of `total` rows. A page past the end
    /// is clamped to the last page.
    pub fn window(&self, total: u64) -> PageWindow {
        let per_page = u64::from(self.per_page);
        let total_pages = total.div_ceil(per_page);
        let last_page = total_pages.max(1);
        let current_page = u64::from(self.page).min(last_page);

        PageWindow {
            current_page: current_page as u32,
            total_pages: total_pages.min(u32::MAX as u64) as u32,
            limit: self.per_page,
            offset: (current_page - 1) * per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: u32,
    pub total_pages: u32,
    pub limit: u32,
    pub offset: u64,
}

/// One page of results. Search pages carry field-keyed records; other listings
/// reuse the same paging contract with their own item type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage<T = Record> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u32,
    pub current_page: u32,
}

impl<T> ResultPage<T> {
    pub fn new(items: Vec<T>, total: u64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            total_pages: window.total_pages,
            current_page: window.current_page,
        }
    }
}
