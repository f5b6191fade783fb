//! Category page offset calculation.
//!
//! The storefront pages its category listing with an offset query parameter
//! (`start=32`, `start=64`, ...). The first page carries no offset at all.

use url::Url;

#[derive(Debug, Clone)]
pub struct PaginationCalculator {
    products_per_page: u32,
    offset_param: String,
}

impl PaginationCalculator {
    pub fn new(products_per_page: u32, offset_param: impl Into<String>) -> Self {
        Self {
            products_per_page,
            offset_param: offset_param.into(),
        }
    }

    /// Offset of the first product on a zero-based page
    pub fn offset(&self, page_index: u32) -> u32 {
        page_index.saturating_mul(self.products_per_page)
    }

    /// URL of a zero-based category page. Page 0 is the base URL untouched.
    pub fn page_url(&self, base: &Url, page_index: u32) -> Url {
        let offset = self.offset(page_index);
        let mut url = base.clone();
        if offset > 0 {
            url.query_pairs_mut()
                .append_pair(&self.offset_param, &offset.to_string());
        }
        url
    }

    /// Detected page counts below 1 still crawl the base page once.
    pub fn clamp_page_count(detected: i64) -> u32 {
        u32::try_from(detected.max(1)).unwrap_or(u32::MAX)
    }
}
